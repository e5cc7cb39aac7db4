//! Type casting.

use crate::ast::{Expr, IntoExpr};

/// `CAST(expr AS target_type)`
pub fn cast(expr: impl IntoExpr, target_type: &str) -> Expr {
    Expr::Cast {
        expr: Box::new(expr.into_expr()),
        target: target_type.to_string(),
    }
}

impl Expr {
    pub fn cast(self, target_type: &str) -> Expr {
        cast(self, target_type)
    }
}
