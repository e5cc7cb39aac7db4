//! CASE WHEN expression builders.

use crate::ast::{Expr, IntoExpr};

/// Start a searched CASE: `CASE WHEN cond THEN value ...`
pub fn case_when(condition: Expr, then_expr: impl IntoExpr) -> CaseBuilder {
    CaseBuilder {
        operand: None,
        when_clauses: vec![(condition, then_expr.into_expr())],
        else_value: None,
    }
}

/// Start a simple CASE: `CASE operand WHEN value THEN result ...`
pub fn case(operand: impl IntoExpr) -> CaseBuilder {
    CaseBuilder {
        operand: Some(operand.into_expr()),
        when_clauses: vec![],
        else_value: None,
    }
}

/// Builder for CASE expressions
#[derive(Debug, Clone)]
pub struct CaseBuilder {
    operand: Option<Expr>,
    when_clauses: Vec<(Expr, Expr)>,
    else_value: Option<Expr>,
}

impl CaseBuilder {
    /// Add another WHEN clause
    pub fn when(mut self, condition: impl IntoExpr, then_expr: impl IntoExpr) -> Self {
        let condition = condition.into_expr();
        let condition = match &self.operand {
            Some(operand) => condition.coerced_to(operand.sql_type()),
            None => condition,
        };
        self.when_clauses.push((condition, then_expr.into_expr()));
        self
    }

    /// Add ELSE clause
    pub fn otherwise(mut self, else_expr: impl IntoExpr) -> Self {
        self.else_value = Some(else_expr.into_expr());
        self
    }

    /// Add alias (AS name)
    pub fn alias(self, name: &str) -> Expr {
        self.build().alias(name)
    }

    /// Build the final Expr
    pub fn build(self) -> Expr {
        Expr::Case {
            operand: self.operand.map(Box::new),
            whens: self.when_clauses,
            else_: self.else_value.map(Box::new),
        }
    }
}

impl IntoExpr for CaseBuilder {
    fn into_expr(self) -> Expr {
        self.build()
    }
}

impl From<CaseBuilder> for Expr {
    fn from(builder: CaseBuilder) -> Self {
        builder.build()
    }
}
