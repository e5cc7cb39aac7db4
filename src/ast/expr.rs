//! The expression node tree.
//!
//! Every syntactic unit that can appear inside a statement is an [`Expr`].
//! Nodes are immutable once built; the algebra in [`crate::ast::builders`]
//! always returns new nodes, so sub-expressions can be shared freely between
//! queries.

use chrono::{NaiveDate, NaiveDateTime};

use crate::ast::source::ColumnRef;
use crate::ast::{
    ATOM_PRECEDENCE, NullsOrder, Operator, Precedence, Query, Select, SelectBuilder, Source,
    SortOrder, SqlType, UnaryOp, Value,
};

/// A compileable expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Field of a source, with its declared type when known
    Column(ColumnRef),
    /// Literal; always sent as a bound parameter
    Value {
        value: Value,
        sql_type: Option<SqlType>,
    },
    /// Verbatim SQL. `?` marks parameter positions when `params` is non-empty.
    Raw { sql: String, params: Vec<Value> },
    Function(Function),
    Binary {
        left: Box<Expr>,
        op: Operator,
        right: Box<Expr>,
        /// Same-operator AND/OR children render as one flat chain
        flat: bool,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Ordered children joined by a separator, e.g. an IN list
    Clause {
        items: Vec<Expr>,
        separator: &'static str,
        parens: bool,
    },
    /// `expr AS "name"` in a projection, `"name"` when referenced from ORDER/GROUP BY
    Alias { expr: Box<Expr>, name: String },
    /// `*`, or `alias.*` for one source
    Star(Option<Source>),
    Case {
        operand: Option<Box<Expr>>,
        whens: Vec<(Expr, Expr)>,
        else_: Option<Box<Expr>>,
    },
    Cast { expr: Box<Expr>, target: String },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    /// Scalar or list subquery
    Subquery(Box<Query>),
    Exists { query: Box<Query>, negated: bool },
    /// The row proposed for insertion, inside an upsert's update list
    Excluded(String),
}

/// SQL function application, optionally DISTINCT and windowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
    pub over: Option<Window>,
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub expr: Expr,
    pub order: SortOrder,
    pub nulls: Option<NullsOrder>,
}

impl OrderTerm {
    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }
}

impl From<Expr> for OrderTerm {
    fn from(expr: Expr) -> Self {
        OrderTerm {
            expr,
            order: SortOrder::Asc,
            nulls: None,
        }
    }
}

/// `OVER (PARTITION BY .. ORDER BY .. frame)`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Window {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderTerm>,
    pub frame: Option<WindowFrame>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition_by(mut self, expr: impl IntoExpr) -> Self {
        self.partition_by.push(expr.into_expr());
        self
    }

    pub fn order_by(mut self, term: impl Into<OrderTerm>) -> Self {
        self.order_by.push(term.into());
        self
    }

    pub fn frame(mut self, frame: WindowFrame) -> Self {
        self.frame = Some(frame);
        self
    }
}

/// Window frame specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFrame {
    /// ROWS BETWEEN start AND end
    Rows { start: FrameBound, end: FrameBound },
    /// RANGE BETWEEN start AND end
    Range { start: FrameBound, end: FrameBound },
}

/// Window frame boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(u64),
    CurrentRow,
    Following(u64),
    UnboundedFollowing,
}

impl Expr {
    /// Literal with no type hint.
    pub fn value(value: impl Into<Value>) -> Self {
        Expr::Value {
            value: value.into(),
            sql_type: None,
        }
    }

    pub fn null() -> Self {
        Expr::value(Value::Null)
    }

    /// Verbatim SQL. The caller is responsible for its correctness and safety.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw {
            sql: sql.into(),
            params: vec![],
        }
    }

    /// Verbatim SQL where each `?` is bound to the next entry of `params`.
    pub fn raw_with<I, V>(sql: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::Raw {
            sql: sql.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Comma separated, parenthesized list.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        Expr::Clause {
            items: items.into_iter().map(IntoExpr::into_expr).collect(),
            separator: ", ",
            parens: true,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, Expr::Value { value, .. } if value.is_null())
    }

    /// Binding strength of this node's top-level operator.
    pub fn precedence(&self) -> Precedence {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { op, .. } => op.precedence(),
            Expr::Between { .. } => Operator::Eq.precedence(),
            Expr::Exists { negated: true, .. } => UnaryOp::Not.precedence(),
            Expr::Alias { expr, .. } => expr.precedence(),
            Expr::Clause { parens: false, .. } => 0,
            // Opaque text: always parenthesized when nested
            Expr::Raw { .. } => 0,
            _ => ATOM_PRECEDENCE,
        }
    }

    pub fn is_atom(&self) -> bool {
        self.precedence() >= ATOM_PRECEDENCE
    }

    /// The declared type of a column node.
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            Expr::Column(c) => c.sql_type,
            Expr::Value { sql_type, .. } => *sql_type,
            Expr::Alias { expr, .. } => expr.sql_type(),
            _ => None,
        }
    }

    /// Name this expression has in a result set, when it has one.
    pub fn output_name(&self) -> Option<String> {
        match self {
            Expr::Column(c) => Some(c.name.clone()),
            Expr::Alias { name, .. } => Some(name.clone()),
            Expr::Function(f) => Some(f.name.to_lowercase()),
            _ => None,
        }
    }

    /// Re-type an untyped literal towards `ty`. Other nodes pass through.
    pub(crate) fn coerced_to(self, ty: Option<SqlType>) -> Expr {
        match (self, ty) {
            (
                Expr::Value {
                    value,
                    sql_type: None,
                },
                Some(ty),
            ) => Expr::Value {
                value: value.coerce(ty),
                sql_type: Some(ty),
            },
            (Expr::Clause {
                items,
                separator,
                parens,
            }, Some(ty)) => Expr::Clause {
                items: items.into_iter().map(|e| e.coerced_to(Some(ty))).collect(),
                separator,
                parens,
            },
            (expr, _) => expr,
        }
    }

    /// Visit every source this expression references, subqueries excluded.
    pub fn sources(&self) -> Vec<Source> {
        let mut out = Vec::new();
        self.collect_sources(&mut out);
        out
    }

    fn collect_sources(&self, out: &mut Vec<Source>) {
        match self {
            Expr::Column(c) => {
                if !out.contains(&c.source) {
                    out.push(c.source.clone());
                }
            }
            Expr::Star(Some(s)) => {
                if !out.contains(s) {
                    out.push(s.clone());
                }
            }
            Expr::Function(f) => f.args.iter().for_each(|a| a.collect_sources(out)),
            Expr::Binary { left, right, .. } => {
                left.collect_sources(out);
                right.collect_sources(out);
            }
            Expr::Unary { operand, .. } => operand.collect_sources(out),
            Expr::Clause { items, .. } => items.iter().for_each(|i| i.collect_sources(out)),
            Expr::Alias { expr, .. } | Expr::Cast { expr, .. } => expr.collect_sources(out),
            Expr::Between {
                expr, low, high, ..
            } => {
                expr.collect_sources(out);
                low.collect_sources(out);
                high.collect_sources(out);
            }
            Expr::Case {
                operand,
                whens,
                else_,
            } => {
                if let Some(o) = operand {
                    o.collect_sources(out);
                }
                for (w, t) in whens {
                    w.collect_sources(out);
                    t.collect_sources(out);
                }
                if let Some(e) = else_ {
                    e.collect_sources(out);
                }
            }
            _ => {}
        }
    }
}

/// Conversion of an operand into an expression node.
///
/// Literals become parameter values; queries become subqueries.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Expr {
        self.clone()
    }
}

impl IntoExpr for Value {
    fn into_expr(self) -> Expr {
        Expr::value(self)
    }
}

macro_rules! literal_into_expr {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoExpr for $ty {
                fn into_expr(self) -> Expr {
                    Expr::value(self)
                }
            }
        )*
    };
}

literal_into_expr!(
    bool,
    i32,
    i64,
    u32,
    f64,
    &str,
    String,
    Vec<u8>,
    NaiveDateTime,
    NaiveDate,
    serde_json::Value,
);

impl IntoExpr for &String {
    fn into_expr(self) -> Expr {
        Expr::value(self.as_str())
    }
}

impl<T: Into<Value>> IntoExpr for Option<T> {
    fn into_expr(self) -> Expr {
        Expr::value(self)
    }
}

impl IntoExpr for Query {
    fn into_expr(self) -> Expr {
        Expr::Subquery(Box::new(self))
    }
}

impl IntoExpr for Select {
    fn into_expr(self) -> Expr {
        Expr::Subquery(Box::new(Query::Select(self)))
    }
}

impl IntoExpr for SelectBuilder {
    fn into_expr(self) -> Expr {
        Expr::Subquery(Box::new(Query::Select(self.build())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TableDef;

    #[test]
    fn test_literal_coercion_uses_column_type() {
        let v = 1.into_expr().coerced_to(Some(SqlType::Boolean));
        assert_eq!(
            v,
            Expr::Value {
                value: Value::Bool(true),
                sql_type: Some(SqlType::Boolean)
            }
        );
    }

    #[test]
    fn test_precedence_of_nodes() {
        assert!(Expr::value(1).is_atom());
        assert!(!Expr::raw("a OR b").is_atom());
        let user = Source::named("user");
        assert!(user.col("id").is_atom());
        assert!(Expr::list([1, 2]).is_atom());
    }

    #[test]
    fn test_sources_are_collected_once() {
        let user = Source::table(TableDef::new("user"));
        let expr = Expr::Binary {
            left: Box::new(user.col("a")),
            op: Operator::Add,
            right: Box::new(user.col("b")),
            flat: false,
        };
        assert_eq!(expr.sources(), vec![user]);
    }
}
