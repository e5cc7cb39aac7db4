use serde::{Deserialize, Serialize};

/// Binary operators of the expression algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// IN (list or subquery)
    In,
    /// NOT IN (list or subquery)
    NotIn,
    /// IS, right operand must be the null sentinel
    Is,
    /// IS NOT, right operand must be the null sentinel
    IsNot,
    Like,
    NotLike,
    /// Case-insensitive LIKE; dialects without ILIKE fall back
    ILike,
    NotILike,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    /// Modulo (%)
    Mod,
    /// String concatenation (|| or a dialect function)
    Concat,
    BitAnd,
    BitOr,
}

/// Binding strength, higher binds tighter.
pub type Precedence = u8;

/// Precedence of an atom (column, value, function call); never parenthesized.
pub const ATOM_PRECEDENCE: Precedence = 100;

impl Operator {
    /// Default SQL spelling. Dialect-sensitive operators (LIKE family,
    /// concatenation, bitwise) are remapped by the dialect config.
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::ILike => "ILIKE",
            Operator::NotILike => "NOT ILIKE",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Concat => "||",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
        }
    }

    pub fn precedence(&self) -> Precedence {
        match self {
            Operator::Or => 1,
            Operator::And => 2,
            // 3 is unary NOT
            Operator::Eq
            | Operator::Ne
            | Operator::Lt
            | Operator::Le
            | Operator::Gt
            | Operator::Ge
            | Operator::In
            | Operator::NotIn
            | Operator::Is
            | Operator::IsNot
            | Operator::Like
            | Operator::NotLike
            | Operator::ILike
            | Operator::NotILike => 4,
            Operator::BitOr | Operator::BitAnd => 5,
            Operator::Concat => 6,
            Operator::Add | Operator::Sub => 7,
            Operator::Mul | Operator::Div | Operator::Mod => 8,
        }
    }

    /// AND/OR chains of the same operator flatten into one list.
    pub fn is_flattening(&self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }

    pub fn is_comparison(&self) -> bool {
        self.precedence() == 4
    }

    /// Bitwise and concatenation operators rank differently across dialects
    /// (Postgres puts `&`, `|` and `||` on one level). Mixed with any other
    /// operator they are always parenthesized.
    pub fn is_strict(&self) -> bool {
        matches!(self, Operator::BitAnd | Operator::BitOr | Operator::Concat)
    }

    /// Whether `(a op b) op c` may drop its parentheses.
    /// Comparisons are non-associative in Postgres, so they never chain.
    pub fn is_left_associative(&self) -> bool {
        !self.is_comparison()
    }

    /// The operator that `NOT (a op b)` rewrites to, when one exists.
    pub fn negated(&self) -> Option<Operator> {
        match self {
            Operator::Is => Some(Operator::IsNot),
            Operator::IsNot => Some(Operator::Is),
            Operator::In => Some(Operator::NotIn),
            Operator::NotIn => Some(Operator::In),
            Operator::Like => Some(Operator::NotLike),
            Operator::NotLike => Some(Operator::Like),
            Operator::ILike => Some(Operator::NotILike),
            Operator::NotILike => Some(Operator::ILike),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql_symbol())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    /// Arithmetic negation (-x)
    Neg,
}

impl UnaryOp {
    pub fn precedence(&self) -> Precedence {
        match self {
            UnaryOp::Not => 3,
            UnaryOp::Neg => 9,
        }
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    /// FULL OUTER JOIN
    Full,
    /// CROSS JOIN, takes no predicate
    Cross,
}

impl JoinKind {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT OUTER JOIN",
            JoinKind::Right => "RIGHT OUTER JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// Sort order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Explicit placement of NULLs in ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullsOrder {
    First,
    Last,
}

/// Set operation type for combining queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOp {
    /// UNION (removes duplicates)
    Union,
    /// UNION ALL (keeps duplicates)
    UnionAll,
    /// INTERSECT (common rows)
    Intersect,
    /// EXCEPT (rows in first but not second)
    Except,
}

impl SetOp {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SetOp::Union => "UNION",
            SetOp::UnionAll => "UNION ALL",
            SetOp::Intersect => "INTERSECT",
            SetOp::Except => "EXCEPT",
        }
    }
}

/// Row locking clause appended to a SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockMode {
    Update,
    Share,
    UpdateNowait,
    UpdateSkipLocked,
}

impl LockMode {
    pub fn sql_clause(&self) -> &'static str {
        match self {
            LockMode::Update => "FOR UPDATE",
            LockMode::Share => "FOR SHARE",
            LockMode::UpdateNowait => "FOR UPDATE NOWAIT",
            LockMode::UpdateSkipLocked => "FOR UPDATE SKIP LOCKED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_binds_looser_than_comparison() {
        assert!(Operator::Or.precedence() < Operator::And.precedence());
        assert!(Operator::And.precedence() < UnaryOp::Not.precedence());
        assert!(UnaryOp::Not.precedence() < Operator::Eq.precedence());
        assert!(Operator::Add.precedence() < Operator::Mul.precedence());
    }

    #[test]
    fn test_negated_pairs_are_symmetric() {
        for op in [Operator::Is, Operator::In, Operator::Like, Operator::ILike] {
            let neg = op.negated().unwrap();
            assert_eq!(neg.negated(), Some(op));
        }
        assert_eq!(Operator::Eq.negated(), None);
    }
}
