//! WITH clause generation.

use crate::ast::{Select, Source, SourceKind};
use crate::error::QuarryResult;
use crate::transpiler::context::Compiler;

impl Compiler<'_> {
    /// `WITH [RECURSIVE] "name" ("a", "b") AS (...), ... ` for the CTEs this
    /// select declares or reads from, skipping ones an enclosing WITH declared.
    pub(crate) fn with_clause(&mut self, select: &Select) -> QuarryResult<()> {
        let mut ctes: Vec<&Source> = Vec::new();
        let referenced = select
            .sources()
            .filter(|s| matches!(s.kind(), SourceKind::Cte(_)));
        for source in select.ctes.iter().chain(referenced) {
            if source.cte_def().is_some() && !self.cte_declared(source) && !ctes.contains(&source)
            {
                ctes.push(source);
            }
        }
        if ctes.is_empty() {
            return Ok(());
        }

        let recursive = ctes
            .iter()
            .any(|s| s.cte_def().map(|c| c.recursive).unwrap_or(false));
        self.push_str("WITH ");
        if recursive && self.dialect.recursive_keyword {
            self.push_str("RECURSIVE ");
        }
        for (i, source) in ctes.iter().enumerate() {
            let Some(cte) = source.cte_def() else {
                continue;
            };
            if i > 0 {
                self.push_str(", ");
            }
            self.quoted(&cte.name);
            if !cte.columns.is_empty() {
                self.push_str(" (");
                for (j, column) in cte.columns.iter().enumerate() {
                    if j > 0 {
                        self.push_str(", ");
                    }
                    self.quoted(column);
                }
                self.push(')');
            }
            self.push_str(" AS (");
            self.declare_cte(source);
            let saved = self.isolate_scopes();
            self.query(&cte.query)?;
            self.restore_scopes(saved);
            self.push(')');
        }
        self.push(' ');
        Ok(())
    }
}
