//! UPDATE SQL generation.

use crate::ast::Update;
use crate::error::QuarryResult;
use crate::transpiler::context::Compiler;

impl Compiler<'_> {
    /// Generate UPDATE SQL. Columns are qualified by table name.
    pub fn update(&mut self, update: &Update) -> QuarryResult<()> {
        self.register_table(&update.table)?;
        self.push_scope([&update.table]);

        let table = self.table_name(&update.table)?;
        self.push_str("UPDATE ");
        self.push_str(&table);
        self.push_str(" SET ");
        self.assignments(&update.assignments)?;

        if let Some(filter) = &update.filter {
            self.push_str(" WHERE ");
            self.predicate(filter)?;
        }
        self.returning(&update.returning)?;

        self.pop_scope();
        Ok(())
    }
}
