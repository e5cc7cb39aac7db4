//! INSERT and upsert generation.

use crate::ast::{ConflictAction, Insert, InsertSource};
use crate::error::{QuarryError, QuarryResult};
use crate::transpiler::context::{AliasMode, Compiler};
use crate::transpiler::dialect::UpsertStyle;

impl Compiler<'_> {
    /// Generate INSERT SQL.
    pub fn insert(&mut self, insert: &Insert) -> QuarryResult<()> {
        self.register_table(&insert.table)?;
        let table = self.table_name(&insert.table)?;

        let ignore = matches!(
            (&insert.on_conflict, self.dialect.upsert),
            (
                Some(crate::ast::OnConflict {
                    action: ConflictAction::DoNothing,
                    ..
                }),
                UpsertStyle::OnDuplicateKey
            )
        );
        self.push_str(if ignore {
            "INSERT IGNORE INTO "
        } else {
            "INSERT INTO "
        });
        self.push_str(&table);

        if !insert.columns.is_empty() {
            self.push_str(" (");
            for (i, column) in insert.columns.iter().enumerate() {
                if i > 0 {
                    self.push_str(", ");
                }
                self.quoted(column);
            }
            self.push(')');
        }

        // Row values never see the target table
        let saved = self.isolate_scopes();
        match &insert.source {
            InsertSource::Values(rows) => {
                self.push_str(" VALUES ");
                for (i, row) in rows.iter().enumerate() {
                    if row.len() != insert.columns.len() {
                        return Err(QuarryError::malformed(format!(
                            "insert row has {} values for {} columns",
                            row.len(),
                            insert.columns.len()
                        )));
                    }
                    if i > 0 {
                        self.push_str(", ");
                    }
                    self.push('(');
                    self.list(row, ", ", AliasMode::Inline)?;
                    self.push(')');
                }
            }
            InsertSource::Query(query) => {
                self.push(' ');
                self.query(query)?;
            }
            InsertSource::DefaultValues => {
                self.push(' ');
                let clause = self.dialect.default_values.clone();
                self.push_str(&clause);
            }
        }
        self.restore_scopes(saved);

        self.push_scope([&insert.table]);
        if let Some(on_conflict) = &insert.on_conflict {
            match (self.dialect.upsert, &on_conflict.action) {
                (UpsertStyle::Unsupported, _) => return Err(self.unsupported("upsert")),
                (UpsertStyle::OnDuplicateKey, ConflictAction::DoNothing) => {}
                (UpsertStyle::OnDuplicateKey, ConflictAction::Update(assignments)) => {
                    self.push_str(" ON DUPLICATE KEY UPDATE ");
                    self.assignments(assignments)?;
                }
                (UpsertStyle::OnConflict, action) => {
                    self.push_str(" ON CONFLICT");
                    if !on_conflict.target.is_empty() {
                        self.push_str(" (");
                        for (i, column) in on_conflict.target.iter().enumerate() {
                            if i > 0 {
                                self.push_str(", ");
                            }
                            self.quoted(column);
                        }
                        self.push(')');
                    }
                    match action {
                        ConflictAction::DoNothing => self.push_str(" DO NOTHING"),
                        ConflictAction::Update(assignments) => {
                            if on_conflict.target.is_empty() {
                                return Err(QuarryError::malformed(
                                    "ON CONFLICT DO UPDATE requires a conflict target",
                                ));
                            }
                            self.push_str(" DO UPDATE SET ");
                            self.assignments(assignments)?;
                        }
                    }
                }
            }
        }
        self.returning(&insert.returning)?;
        self.pop_scope();
        Ok(())
    }

    /// `"a" = expr, "b" = expr`
    pub(crate) fn assignments(&mut self, assignments: &[(String, crate::ast::Expr)]) -> QuarryResult<()> {
        if assignments.is_empty() {
            return Err(QuarryError::malformed("no columns to assign"));
        }
        for (i, (column, value)) in assignments.iter().enumerate() {
            if i > 0 {
                self.push_str(", ");
            }
            self.quoted(column);
            self.push_str(" = ");
            self.expr(value, AliasMode::Inline)?;
        }
        Ok(())
    }
}
