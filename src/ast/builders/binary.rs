//! Arithmetic, concatenation, bitwise and ordering helpers, plus the
//! `std::ops` overloads that map onto them.

use std::ops;

use crate::ast::builders::conditions::binary;
use crate::ast::{Expr, IntoExpr, Operator, OrderTerm, SortOrder, UnaryOp};

impl Expr {
    pub fn add(self, rhs: impl IntoExpr) -> Expr {
        binary(self, Operator::Add, rhs.into_expr())
    }

    pub fn sub(self, rhs: impl IntoExpr) -> Expr {
        binary(self, Operator::Sub, rhs.into_expr())
    }

    pub fn mul(self, rhs: impl IntoExpr) -> Expr {
        binary(self, Operator::Mul, rhs.into_expr())
    }

    pub fn div(self, rhs: impl IntoExpr) -> Expr {
        binary(self, Operator::Div, rhs.into_expr())
    }

    pub fn modulo(self, rhs: impl IntoExpr) -> Expr {
        binary(self, Operator::Mod, rhs.into_expr())
    }

    /// String concatenation; `||` or a dialect function.
    pub fn concat(self, rhs: impl IntoExpr) -> Expr {
        binary(self, Operator::Concat, rhs.into_expr())
    }

    pub fn bit_and(self, rhs: impl IntoExpr) -> Expr {
        binary(self, Operator::BitAnd, rhs.into_expr())
    }

    pub fn bit_or(self, rhs: impl IntoExpr) -> Expr {
        binary(self, Operator::BitOr, rhs.into_expr())
    }

    /// Arithmetic negation.
    pub fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(self),
        }
    }

    /// Name this expression in a projection.
    pub fn alias(self, name: impl Into<String>) -> Expr {
        let expr = match self {
            Expr::Alias { expr, .. } => expr,
            other => Box::new(other),
        };
        Expr::Alias {
            expr,
            name: name.into(),
        }
    }

    pub fn asc(self) -> OrderTerm {
        OrderTerm {
            expr: self,
            order: SortOrder::Asc,
            nulls: None,
        }
    }

    pub fn desc(self) -> OrderTerm {
        OrderTerm {
            expr: self,
            order: SortOrder::Desc,
            nulls: None,
        }
    }
}

/// `a & b` is boolean AND
impl<T: IntoExpr> ops::BitAnd<T> for Expr {
    type Output = Expr;

    fn bitand(self, rhs: T) -> Expr {
        self.and(rhs)
    }
}

/// `a | b` is boolean OR
impl<T: IntoExpr> ops::BitOr<T> for Expr {
    type Output = Expr;

    fn bitor(self, rhs: T) -> Expr {
        self.or(rhs)
    }
}

/// `!a` is logical NOT
impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::not(self)
    }
}

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::neg(self)
    }
}

macro_rules! arithmetic_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: IntoExpr> ops::$trait<T> for Expr {
            type Output = Expr;

            fn $method(self, rhs: T) -> Expr {
                binary(self, $op, rhs.into_expr())
            }
        }
    };
}

arithmetic_op!(Add, add, Operator::Add);
arithmetic_op!(Sub, sub, Operator::Sub);
arithmetic_op!(Mul, mul, Operator::Mul);
arithmetic_op!(Div, div, Operator::Div);
arithmetic_op!(Rem, rem, Operator::Mod);
