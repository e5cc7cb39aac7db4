//! SELECT nodes and the builder that accumulates them.

use crate::ast::{
    CompoundSelect, Expr, IntoExpr, Join, JoinKind, LockMode, OrderTerm, Query, SetOp, Source,
};
use crate::error::QuarryResult;

/// A frozen SELECT statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    /// CTE sources declared in the WITH clause
    pub ctes: Vec<Source>,
    pub distinct: bool,
    pub columns: Vec<Expr>,
    pub from: Vec<Source>,
    pub joins: Vec<Join>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderTerm>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub lock: Option<LockMode>,
}

impl Select {
    /// Output expressions in order. An empty column list selects every field
    /// of the primary source; `source.*` expands to the source's declared
    /// fields when they are known.
    pub fn projection(&self) -> Vec<Expr> {
        if self.columns.is_empty() {
            return match self.from.first() {
                Some(primary) => expand_star(primary),
                None => vec![],
            };
        }
        self.columns
            .iter()
            .flat_map(|c| match c {
                Expr::Star(Some(source)) => expand_star(source),
                other => vec![other.clone()],
            })
            .collect()
    }

    /// Every source rows are drawn from: FROM entries then join targets.
    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.from.iter().chain(self.joins.iter().map(|j| &j.target))
    }

    pub fn output_names(&self) -> Vec<String> {
        self.projection()
            .iter()
            .filter_map(Expr::output_name)
            .collect()
    }
}

fn expand_star(source: &Source) -> Vec<Expr> {
    let names = source.field_names();
    if names.is_empty() {
        vec![source.star()]
    } else {
        names.into_iter().map(|n| source.col(n)).collect()
    }
}

/// Fluent SELECT construction.
///
/// The join context (the source the next inferred join departs from) lives
/// here and never reaches the frozen [`Select`].
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    query: Select,
    join_context: Option<Source>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append projection expressions.
    pub fn columns<I, T>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        self.query
            .columns
            .extend(columns.into_iter().map(IntoExpr::into_expr));
        self
    }

    pub fn column(mut self, column: impl IntoExpr) -> Self {
        self.query.columns.push(column.into_expr());
        self
    }

    /// Add a FROM source. The first one becomes the primary source and the
    /// initial join context.
    pub fn from(mut self, source: &Source) -> Self {
        if self.join_context.is_none() {
            self.join_context = Some(source.clone());
        }
        self.query.from.push(source.clone());
        self
    }

    /// INNER JOIN `target`, inferring the predicate from the single foreign
    /// key between the join context and `target`.
    pub fn join(self, target: &Source) -> QuarryResult<Self> {
        self.join_kind(target, JoinKind::Inner)
    }

    /// LEFT OUTER JOIN with an inferred predicate.
    pub fn left_join(self, target: &Source) -> QuarryResult<Self> {
        self.join_kind(target, JoinKind::Left)
    }

    pub fn join_kind(mut self, target: &Source, kind: JoinKind) -> QuarryResult<Self> {
        let join = match (&self.join_context, kind) {
            (_, JoinKind::Cross) => Join::cross(target),
            (Some(context), _) => Join::inferred(context, target, kind)?,
            (None, _) => return Err(crate::error::QuarryError::EmptyQuery),
        };
        self.push_join(join);
        Ok(self)
    }

    /// Join with an explicit predicate.
    pub fn join_on(mut self, target: &Source, kind: JoinKind, on: Expr) -> Self {
        self.push_join(Join::on(target, kind, on));
        self
    }

    pub fn cross_join(mut self, target: &Source) -> Self {
        self.push_join(Join::cross(target));
        self
    }

    fn push_join(&mut self, join: Join) {
        self.join_context = Some(join.target.clone());
        self.query.joins.push(join);
    }

    /// Re-point the join context without adding a join.
    pub fn switch(mut self, source: &Source) -> Self {
        self.join_context = Some(source.clone());
        self
    }

    /// `switch(from)` followed by an inferred inner `join(to)`.
    pub fn join_from(self, from: &Source, to: &Source) -> QuarryResult<Self> {
        self.switch(from).join(to)
    }

    /// The source the next inferred join departs from.
    pub fn join_context(&self) -> Option<&Source> {
        self.join_context.as_ref()
    }

    /// AND `predicate` onto the WHERE clause.
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.query.filter = Some(match self.query.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// AND `predicate` onto the HAVING clause.
    pub fn having(mut self, predicate: Expr) -> Self {
        self.query.having = Some(match self.query.having.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn group_by<I, T>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        self.query
            .group_by
            .extend(exprs.into_iter().map(IntoExpr::into_expr));
        self
    }

    /// Append an ORDER BY term; a bare expression sorts ascending.
    pub fn order_by(mut self, term: impl Into<OrderTerm>) -> Self {
        self.query.order_by.push(term.into());
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.query.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.query.offset = Some(n);
        self
    }

    /// 1-based page of `per_page` rows.
    pub fn paginate(self, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        self.limit(per_page).offset((page - 1) * per_page)
    }

    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    /// Declare a CTE in the WITH clause. Select from it with [`SelectBuilder::from`].
    pub fn with_cte(mut self, cte: &Source) -> Self {
        self.query.ctes.push(cte.clone());
        self
    }

    pub fn lock(mut self, mode: LockMode) -> Self {
        self.query.lock = Some(mode);
        self
    }

    pub fn for_update(self) -> Self {
        self.lock(LockMode::Update)
    }

    pub fn union(self, other: impl Into<Query>) -> CompoundSelect {
        CompoundSelect::new(SetOp::Union, self, other)
    }

    pub fn union_all(self, other: impl Into<Query>) -> CompoundSelect {
        CompoundSelect::new(SetOp::UnionAll, self, other)
    }

    pub fn intersect(self, other: impl Into<Query>) -> CompoundSelect {
        CompoundSelect::new(SetOp::Intersect, self, other)
    }

    pub fn except_(self, other: impl Into<Query>) -> CompoundSelect {
        CompoundSelect::new(SetOp::Except, self, other)
    }

    /// Rows in exactly one side: `(a EXCEPT b) UNION (b EXCEPT a)`.
    pub fn symmetric_difference(self, other: impl Into<Query>) -> CompoundSelect {
        CompoundSelect::symmetric_difference(self, other)
    }

    /// Freeze into an immutable [`Select`], expanding the projection.
    pub fn build(self) -> Select {
        let mut query = self.query;
        query.columns = query.projection();
        query
    }
}

impl From<SelectBuilder> for Select {
    fn from(builder: SelectBuilder) -> Self {
        builder.build()
    }
}
