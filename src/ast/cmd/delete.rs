use crate::ast::{Expr, IntoExpr, Source};

/// A frozen DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: Source,
    pub filter: Option<Expr>,
    pub returning: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    query: Delete,
}

impl DeleteBuilder {
    pub fn new(table: &Source) -> Self {
        Self {
            query: Delete {
                table: table.clone(),
                filter: None,
                returning: vec![],
            },
        }
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

    pub fn build(self) -> Delete {
        self.query
    }
}

impl From<DeleteBuilder> for Delete {
    fn from(builder: DeleteBuilder) -> Self {
        builder.build()
    }
}
