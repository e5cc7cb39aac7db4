//! Function calls, aggregates and window application.

use crate::ast::{Expr, Function, IntoExpr, Window};

/// Call an arbitrary SQL function.
pub fn func<I, T>(name: &str, args: I) -> Expr
where
    I: IntoIterator<Item = T>,
    T: IntoExpr,
{
    Expr::Function(Function {
        name: name.to_string(),
        args: args.into_iter().map(IntoExpr::into_expr).collect(),
        distinct: false,
        over: None,
    })
}

/// COUNT(expr)
pub fn count(expr: impl IntoExpr) -> Expr {
    func("COUNT", [expr.into_expr()])
}

/// COUNT(*)
pub fn count_star() -> Expr {
    func("COUNT", [Expr::Star(None)])
}

/// COUNT(DISTINCT expr)
pub fn count_distinct(expr: impl IntoExpr) -> Expr {
    count(expr).distinct()
}

pub fn sum(expr: impl IntoExpr) -> Expr {
    func("SUM", [expr.into_expr()])
}

pub fn avg(expr: impl IntoExpr) -> Expr {
    func("AVG", [expr.into_expr()])
}

pub fn min(expr: impl IntoExpr) -> Expr {
    func("MIN", [expr.into_expr()])
}

pub fn max(expr: impl IntoExpr) -> Expr {
    func("MAX", [expr.into_expr()])
}

pub fn lower(expr: impl IntoExpr) -> Expr {
    func("LOWER", [expr.into_expr()])
}

pub fn upper(expr: impl IntoExpr) -> Expr {
    func("UPPER", [expr.into_expr()])
}

/// COALESCE(a, b, ...)
pub fn coalesce<I, T>(exprs: I) -> Expr
where
    I: IntoIterator<Item = T>,
    T: IntoExpr,
{
    func("COALESCE", exprs)
}

/// ROW_NUMBER(), use with [`Expr::over`]
pub fn row_number() -> Expr {
    func("ROW_NUMBER", Vec::<Expr>::new())
}

pub fn rank() -> Expr {
    func("RANK", Vec::<Expr>::new())
}

impl Expr {
    /// Apply DISTINCT to a function's arguments. No effect on other nodes.
    pub fn distinct(self) -> Expr {
        match self {
            Expr::Function(mut f) => {
                f.distinct = true;
                Expr::Function(f)
            }
            other => other,
        }
    }

    /// Attach an `OVER (...)` window to a function call. No effect on other nodes.
    pub fn over(self, window: Window) -> Expr {
        match self {
            Expr::Function(mut f) => {
                f.over = Some(window);
                Expr::Function(f)
            }
            Expr::Alias { expr, name } => Expr::Alias {
                expr: Box::new(expr.over(window)),
                name,
            },
            other => other,
        }
    }
}
