use crate::ast::{Expr, IntoExpr, Source};

/// A frozen UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: Source,
    pub assignments: Vec<(String, Expr)>,
    pub filter: Option<Expr>,
    pub returning: Vec<Expr>,
}

/// Fluent UPDATE construction.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    query: Update,
}

impl UpdateBuilder {
    pub fn new(table: &Source) -> Self {
        Self {
            query: Update {
                table: table.clone(),
                assignments: vec![],
                filter: None,
                returning: vec![],
            },
        }
    }

    /// `SET column = value`; literals are coerced to the column's declared type.
    pub fn set(mut self, column: &str, value: impl IntoExpr) -> Self {
        let value = value
            .into_expr()
            .coerced_to(self.query.table.field_type(column));
        self.query.assignments.push((column.to_string(), value));
        self
    }

    /// AND `predicate` onto the WHERE clause.
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.query.filter = Some(match self.query.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn returning<I, T>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        self.query
            .returning
            .extend(exprs.into_iter().map(IntoExpr::into_expr));
        self
    }

    pub fn build(self) -> Update {
        self.query
    }
}

impl From<UpdateBuilder> for Update {
    fn from(builder: UpdateBuilder) -> Self {
        builder.build()
    }
}
