//! DELETE SQL generation.

use crate::ast::Delete;
use crate::error::QuarryResult;
use crate::transpiler::context::Compiler;

impl Compiler<'_> {
    /// Generate DELETE SQL.
    pub fn delete(&mut self, delete: &Delete) -> QuarryResult<()> {
        self.register_table(&delete.table)?;
        self.push_scope([&delete.table]);

        let table = self.table_name(&delete.table)?;
        self.push_str("DELETE FROM ");
        self.push_str(&table);
        if let Some(filter) = &delete.filter {
            self.push_str(" WHERE ");
            self.predicate(filter)?;
        }
        self.returning(&delete.returning)?;

        self.pop_scope();
        Ok(())
    }
}
