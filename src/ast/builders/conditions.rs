//! Comparison and boolean combinators.

use crate::ast::{Expr, IntoExpr, Operator, UnaryOp};
use crate::error::{QuarryError, QuarryResult};

/// Build a binary node, coercing a bare literal towards the type of the
/// column on the other side.
pub(crate) fn binary(left: Expr, op: Operator, right: Expr) -> Expr {
    let left_ty = left.sql_type();
    let right_ty = right.sql_type();
    let (left, right) = match (&left, &right) {
        (Expr::Column(_), _) => (left, right.coerced_to(left_ty)),
        (_, Expr::Column(_)) => (left.coerced_to(right_ty), right),
        _ => (left, right),
    };
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
        flat: op.is_flattening(),
    }
}

impl Expr {
    /// Generic comparison. Every named comparison method funnels through here.
    ///
    /// Equality against NULL is redirected to `IS [NOT] NULL`; ordering or
    /// pattern comparisons against NULL are rejected.
    pub fn compare(self, op: Operator, rhs: impl IntoExpr) -> QuarryResult<Expr> {
        let rhs = rhs.into_expr();
        let (lhs, rhs) = if self.is_null_literal() && !rhs.is_null_literal() {
            (rhs, self)
        } else {
            (self, rhs)
        };
        match op {
            Operator::Eq | Operator::Ne if rhs.is_null_literal() => {
                let op = if op == Operator::Eq {
                    Operator::Is
                } else {
                    Operator::IsNot
                };
                Ok(binary(lhs, op, rhs))
            }
            Operator::Is | Operator::IsNot if !rhs.is_null_literal() => Err(
                QuarryError::malformed(format!("{} requires NULL on its right side", op)),
            ),
            Operator::Is | Operator::IsNot => Ok(binary(lhs, op, rhs)),
            Operator::In | Operator::NotIn => match rhs {
                Expr::Clause { .. } | Expr::Subquery(_) | Expr::Raw { .. } => {
                    Ok(binary(lhs, op, rhs))
                }
                other => Err(QuarryError::malformed(format!(
                    "{} expects a list or subquery, got {:?}",
                    op, other
                ))),
            },
            _ if op.is_comparison() && (rhs.is_null_literal() || lhs.is_null_literal()) => {
                Err(QuarryError::malformed(format!(
                    "comparison '{}' against NULL is never true; use is_null()",
                    op
                )))
            }
            Operator::And | Operator::Or => Ok(binary(lhs, op, rhs)),
            _ if op.is_comparison() => Ok(binary(lhs, op, rhs)),
            _ => Err(QuarryError::malformed(format!(
                "'{}' is not a comparison operator",
                op
            ))),
        }
    }

    pub fn eq(self, rhs: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::Eq, rhs)
    }

    pub fn ne(self, rhs: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::Ne, rhs)
    }

    pub fn lt(self, rhs: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::Lt, rhs)
    }

    pub fn le(self, rhs: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::Le, rhs)
    }

    pub fn gt(self, rhs: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::Gt, rhs)
    }

    pub fn ge(self, rhs: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::Ge, rhs)
    }

    pub fn like(self, pattern: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::Like, pattern)
    }

    pub fn not_like(self, pattern: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::NotLike, pattern)
    }

    /// Case-insensitive LIKE
    pub fn ilike(self, pattern: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::ILike, pattern)
    }

    pub fn not_ilike(self, pattern: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::NotILike, pattern)
    }

    pub fn is_null(self) -> Expr {
        binary(self, Operator::Is, Expr::null())
    }

    pub fn is_not_null(self) -> Expr {
        binary(self, Operator::IsNot, Expr::null())
    }

    /// `self IN (v1, v2, ..)`. An empty list compiles to a constant false predicate.
    pub fn is_in<I, T>(self, values: I) -> Expr
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        binary(self, Operator::In, Expr::list(values))
    }

    /// `self NOT IN (v1, v2, ..)`. An empty list compiles to a constant true predicate.
    pub fn not_in<I, T>(self, values: I) -> Expr
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        binary(self, Operator::NotIn, Expr::list(values))
    }

    /// `self IN (SELECT ..)`
    pub fn in_query(self, query: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::In, query)
    }

    pub fn not_in_query(self, query: impl IntoExpr) -> QuarryResult<Expr> {
        self.compare(Operator::NotIn, query)
    }

    pub fn between(self, low: impl IntoExpr, high: impl IntoExpr) -> Expr {
        let ty = self.sql_type();
        Expr::Between {
            expr: Box::new(self),
            low: Box::new(low.into_expr().coerced_to(ty)),
            high: Box::new(high.into_expr().coerced_to(ty)),
            negated: false,
        }
    }

    pub fn not_between(self, low: impl IntoExpr, high: impl IntoExpr) -> Expr {
        self.between(low, high).not()
    }

    /// `EXISTS (SELECT ..)`; the subquery may reference enclosing sources.
    pub fn exists(query: impl Into<crate::ast::Query>) -> Expr {
        Expr::Exists {
            query: Box::new(query.into()),
            negated: false,
        }
    }

    /// Boolean AND; chains flatten into `a AND b AND c`.
    pub fn and(self, rhs: impl IntoExpr) -> Expr {
        binary(self, Operator::And, rhs.into_expr())
    }

    /// Boolean OR; chains flatten into `a OR b OR c`.
    pub fn or(self, rhs: impl IntoExpr) -> Expr {
        binary(self, Operator::Or, rhs.into_expr())
    }

    /// Logical negation.
    ///
    /// Operators with a negated form are rewritten (`IS NULL` becomes
    /// `IS NOT NULL`, `IN` becomes `NOT IN`, ...) instead of being wrapped, and
    /// a double negation collapses.
    pub fn not(self) -> Expr {
        match self {
            Expr::Binary {
                left,
                op,
                right,
                flat,
            } if op.negated().is_some() => Expr::Binary {
                left,
                op: op.negated().unwrap_or(op),
                right,
                flat,
            },
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => Expr::Between {
                expr,
                low,
                high,
                negated: !negated,
            },
            Expr::Exists { query, negated } => Expr::Exists {
                query,
                negated: !negated,
            },
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => *operand,
            other => Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(other),
            },
        }
    }

    /// AND together a sequence of predicates; `None` when the sequence is empty.
    pub fn all<I>(predicates: I) -> Option<Expr>
    where
        I: IntoIterator<Item = Expr>,
    {
        predicates.into_iter().reduce(Expr::and)
    }

    /// OR together a sequence of predicates; `None` when the sequence is empty.
    pub fn any<I>(predicates: I) -> Option<Expr>
    where
        I: IntoIterator<Item = Expr>,
    {
        predicates.into_iter().reduce(Expr::or)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Source, SqlType, TableDef, Value};

    fn user() -> Source {
        Source::table(
            TableDef::new("user")
                .field("id", SqlType::Integer)
                .field("active", SqlType::Boolean),
        )
    }

    #[test]
    fn test_eq_null_redirects_to_is() {
        let u = user();
        let expr = u.col("id").eq(Value::Null).unwrap();
        assert!(matches!(expr, Expr::Binary { op: Operator::Is, .. }));
        let expr = u.col("id").ne(None::<i64>).unwrap();
        assert!(matches!(expr, Expr::Binary { op: Operator::IsNot, .. }));
    }

    #[test]
    fn test_ordering_against_null_is_malformed() {
        let err = user().col("id").gt(Value::Null).unwrap_err();
        assert!(matches!(err, QuarryError::MalformedExpression(_)));
    }

    #[test]
    fn test_in_requires_list() {
        let err = user().col("id").compare(Operator::In, 3).unwrap_err();
        assert!(matches!(err, QuarryError::MalformedExpression(_)));
    }

    #[test]
    fn test_literal_coerced_to_boolean() {
        let expr = user().col("active").eq(1).unwrap();
        match expr {
            Expr::Binary { right, .. } => assert_eq!(
                *right,
                Expr::Value {
                    value: Value::Bool(true),
                    sql_type: Some(SqlType::Boolean)
                }
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_not_rewrites_instead_of_wrapping() {
        let u = user();
        let expr = u.col("id").is_null().not();
        assert!(matches!(expr, Expr::Binary { op: Operator::IsNot, .. }));
        let expr = u.col("id").is_in([1, 2]).not();
        assert!(matches!(expr, Expr::Binary { op: Operator::NotIn, .. }));
        let expr = u.col("id").eq(1).unwrap().not();
        assert!(matches!(expr, Expr::Unary { op: UnaryOp::Not, .. }));
        let back = expr.not();
        assert!(matches!(back, Expr::Binary { op: Operator::Eq, .. }));
    }

    #[test]
    fn test_all_and_any() {
        let u = user();
        assert_eq!(Expr::all(vec![]), None);
        let both = Expr::all(vec![u.col("id").eq(1).unwrap(), u.col("active").eq(true).unwrap()]);
        assert!(matches!(both, Some(Expr::Binary { op: Operator::And, flat: true, .. })));
    }
}
