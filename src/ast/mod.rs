pub mod builders;
pub mod cmd;
pub mod expr;
pub mod joins;
pub mod operators;
pub mod schema;
pub mod source;
pub mod values;

pub use self::builders::{
    CaseBuilder, avg, case, case_when, cast, coalesce, count, count_distinct, count_star, func,
    lower, max, min, rank, row_number, sum, upper,
};
pub use self::cmd::{
    CompoundSelect, ConflictAction, Delete, DeleteBuilder, Insert, InsertBuilder, InsertSource,
    OnConflict, Query, Select, SelectBuilder, Update, UpdateBuilder,
};
pub use self::expr::{Expr, FrameBound, Function, IntoExpr, OrderTerm, Window, WindowFrame};
pub use self::joins::{Join, Relation};
pub use self::operators::{
    ATOM_PRECEDENCE, JoinKind, LockMode, NullsOrder, Operator, Precedence, SetOp, SortOrder,
    UnaryOp,
};
pub use self::schema::{FieldDef, ForeignKey, TableDef};
pub use self::source::{ColumnRef, CteDef, Source, SourceKind};
pub use self::values::{SqlType, Value};
