//! UNION / INTERSECT / EXCEPT generation.

use crate::ast::{CompoundSelect, Query, Source};
use crate::error::QuarryResult;
use crate::transpiler::context::Compiler;

impl Compiler<'_> {
    /// Members render left then right, so parameters concatenate in that order.
    pub fn compound(&mut self, compound: &CompoundSelect) -> QuarryResult<()> {
        self.member(&compound.lhs, false)?;
        self.push(' ');
        self.push_str(compound.op.sql_keyword());
        self.push(' ');
        self.member(&compound.rhs, true)?;

        // Members' aliases are not visible here: order by output name
        let mut sources = Vec::new();
        member_sources(&compound.lhs, &mut sources);
        member_sources(&compound.rhs, &mut sources);
        self.push_scope(sources);
        let bare = self.set_bare_columns(true);
        let ordered = self.order_by(&compound.order_by);
        self.set_bare_columns(bare);
        self.pop_scope();
        ordered?;
        self.pagination(
            compound.limit,
            compound.offset,
            !compound.order_by.is_empty(),
        );
        Ok(())
    }

    fn member(&mut self, query: &Query, right: bool) -> QuarryResult<()> {
        if self.dialect.compound_parentheses {
            self.push('(');
            self.query(query)?;
            self.push(')');
            return Ok(());
        }
        let self_contained = match query {
            Query::Select(s) => {
                s.order_by.is_empty() && s.limit.is_none() && s.offset.is_none() && s.lock.is_none()
            }
            Query::Compound(c) => {
                !right && c.order_by.is_empty() && c.limit.is_none() && c.offset.is_none()
            }
            _ => false,
        };
        if self_contained {
            return self.query(query);
        }
        // Without member parentheses, nest as a derived table instead
        self.push_str("SELECT * FROM (");
        self.query(query)?;
        self.push_str(") AS ");
        let alias = self.anonymous_alias();
        self.push_str(&alias);
        Ok(())
    }
}

/// Sources a compound ORDER BY may name: those of every member select.
fn member_sources<'q>(query: &'q Query, out: &mut Vec<&'q Source>) {
    match query {
        Query::Select(select) => out.extend(select.sources()),
        Query::Compound(compound) => {
            member_sources(&compound.lhs, out);
            member_sources(&compound.rhs, out);
        }
        _ => {}
    }
}
