//! SELECT SQL generation.

use crate::ast::{JoinKind, Select, Source, SourceKind};
use crate::error::{QuarryError, QuarryResult};
use crate::transpiler::context::{AliasMode, Compiler};

impl Compiler<'_> {
    /// Generate SELECT SQL.
    ///
    /// Clause order: WITH, projection, FROM/joins, WHERE, GROUP BY, HAVING,
    /// ORDER BY, pagination, locking.
    pub fn select(&mut self, select: &Select) -> QuarryResult<()> {
        if select.from.is_empty() {
            return Err(QuarryError::EmptyQuery);
        }
        let cte_mark = self.cte_mark();
        self.with_clause(select)?;

        for source in select.sources() {
            self.register(source);
        }
        self.push_scope(select.sources());

        self.push_str("SELECT ");
        if select.distinct {
            self.push_str("DISTINCT ");
        }
        let projection = select.projection();
        self.list(&projection, ", ", AliasMode::Define)?;

        self.push_str(" FROM ");
        for (i, source) in select.from.iter().enumerate() {
            if i > 0 {
                self.push_str(", ");
            }
            self.source_ref(source)?;
        }

        for join in &select.joins {
            if join.kind == JoinKind::Full && !self.dialect.full_join {
                return Err(self.unsupported("FULL OUTER JOIN"));
            }
            self.push(' ');
            self.push_str(join.kind.sql_keyword());
            self.push(' ');
            self.source_ref(&join.target)?;
            match (&join.on, join.kind) {
                (_, JoinKind::Cross) => {}
                (Some(on), _) => {
                    self.push_str(" ON ");
                    self.predicate(on)?;
                }
                (None, _) => {
                    return Err(QuarryError::malformed(format!(
                        "{} to '{}' has no predicate",
                        join.kind.sql_keyword(),
                        join.target.name()
                    )));
                }
            }
        }

        if let Some(filter) = &select.filter {
            self.push_str(" WHERE ");
            self.predicate(filter)?;
        }

        if !select.group_by.is_empty() {
            self.push_str(" GROUP BY ");
            self.list(&select.group_by, ", ", AliasMode::Reference)?;
        }

        if let Some(having) = &select.having {
            self.push_str(" HAVING ");
            self.predicate(having)?;
        }

        self.order_by(&select.order_by)?;
        self.pagination(select.limit, select.offset, !select.order_by.is_empty());

        if let Some(lock) = select.lock {
            if !self.dialect.row_locking {
                return Err(self.unsupported("row locking"));
            }
            self.push(' ');
            self.push_str(lock.sql_clause());
        }

        self.pop_scope();
        self.release_ctes(cte_mark);
        Ok(())
    }

    /// A FROM or JOIN entry: `"table" AS t1`, `"cte" AS t2`, `(SELECT ..) AS t3`.
    pub(crate) fn source_ref(&mut self, source: &Source) -> QuarryResult<()> {
        match source.kind() {
            SourceKind::Table(_) | SourceKind::Cte(_) => {
                let name = self.table_name(source)?;
                self.push_str(&name);
            }
            SourceKind::Subquery(query) => {
                self.push('(');
                let saved = self.isolate_scopes();
                let bare = self.set_bare_columns(false);
                self.query(query)?;
                self.set_bare_columns(bare);
                self.restore_scopes(saved);
                self.push(')');
            }
        }
        self.push_str(" AS ");
        let alias = self.qualifier(source);
        self.push_str(&alias);
        Ok(())
    }
}
