//! DML (Data Manipulation Language) SQL generation.
//!
//! This module contains the statement emitters for SELECT, compound selects,
//! INSERT (with upserts), UPDATE and DELETE, plus the WITH clause and window
//! specifications they share.

pub mod compound;
pub mod cte;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;
pub mod window;

use crate::ast::{Expr, OrderTerm, Query, SortOrder};
use crate::ast::NullsOrder;
use crate::error::QuarryResult;
use crate::transpiler::context::{AliasMode, Compiler};

impl Compiler<'_> {
    /// Render any statement.
    pub fn query(&mut self, query: &Query) -> QuarryResult<()> {
        match query {
            Query::Select(s) => self.select(s),
            Query::Compound(c) => self.compound(c),
            Query::Insert(i) => self.insert(i),
            Query::Update(u) => self.update(u),
            Query::Delete(d) => self.delete(d),
        }
    }

    /// ` ORDER BY a, b DESC` (nothing for an empty list).
    pub(crate) fn order_by(&mut self, terms: &[OrderTerm]) -> QuarryResult<()> {
        if terms.is_empty() {
            return Ok(());
        }
        self.push_str(" ORDER BY ");
        self.order_terms(terms)
    }

    pub(crate) fn order_terms(&mut self, terms: &[OrderTerm]) -> QuarryResult<()> {
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                self.push_str(", ");
            }
            if let (Some(nulls), false) = (term.nulls, self.dialect.nulls_ordering) {
                // Emulate NULLS FIRST/LAST with a leading sort key
                let (null_rank, other_rank) = match nulls {
                    NullsOrder::First => (0, 1),
                    NullsOrder::Last => (1, 0),
                };
                self.push_str("CASE WHEN ");
                self.expr(&term.expr, AliasMode::Reference)?;
                self.push_str(&format!(
                    " IS NULL THEN {} ELSE {} END, ",
                    null_rank, other_rank
                ));
            }
            self.expr(&term.expr, AliasMode::Reference)?;
            if term.order == SortOrder::Desc {
                self.push_str(" DESC");
            }
            if let (Some(nulls), true) = (term.nulls, self.dialect.nulls_ordering) {
                self.push_str(match nulls {
                    NullsOrder::First => " NULLS FIRST",
                    NullsOrder::Last => " NULLS LAST",
                });
            }
        }
        Ok(())
    }

    /// LIMIT/OFFSET in the dialect's syntax. OFFSET/FETCH dialects get a
    /// neutral ORDER BY when the statement has none.
    pub(crate) fn pagination(
        &mut self,
        limit: Option<u64>,
        offset: Option<u64>,
        ordered: bool,
    ) {
        let clause = self.dialect.limit_offset(limit, offset);
        if clause.is_empty() {
            return;
        }
        if !ordered
            && matches!(
                self.dialect.pagination,
                crate::transpiler::dialect::Pagination::OffsetFetch
            )
        {
            self.push_str(" ORDER BY (SELECT NULL)");
        }
        self.push_str(&clause);
    }

    /// ` RETURNING a, b` with unqualified columns.
    pub(crate) fn returning(&mut self, exprs: &[Expr]) -> QuarryResult<()> {
        if exprs.is_empty() {
            return Ok(());
        }
        if !self.dialect.returning {
            return Err(self.unsupported("RETURNING"));
        }
        self.push_str(" RETURNING ");
        let bare = self.set_bare_columns(true);
        self.list(exprs, ", ", AliasMode::Define)?;
        self.set_bare_columns(bare);
        Ok(())
    }
}
