//! The expression algebra.
//!
//! Most of it lives as methods on [`Expr`](crate::ast::Expr) (`eq`, `and`,
//! `not`, `add`, `over`, ...) plus the `std::ops` overloads. Free functions
//! here cover nodes that do not start from an existing expression.
//!
//! # Modules
//!
//! - `conditions` - comparisons, null tests, IN/BETWEEN, AND/OR/NOT
//! - `binary` - arithmetic, concatenation, bitwise, aliases and ordering
//! - `functions` - function calls, aggregates and window application
//! - `case_when` - CASE WHEN expressions
//! - `cast` - type casting
//!
//! # Example
//! ```ignore
//! use quarry::prelude::*;
//!
//! let user = Source::table(TableDef::new("user"));
//! let active = user.col("active").eq(true)?;
//! let named = user.col("name").ilike("a%")?;
//! let pred = active & (named | user.col("email").is_null());
//! ```

pub mod binary;
pub mod case_when;
pub mod cast;
pub mod conditions;
pub mod functions;

pub use case_when::{CaseBuilder, case, case_when};
pub use cast::cast;
pub use functions::{
    avg, coalesce, count, count_distinct, count_star, func, lower, max, min, rank, row_number,
    sum, upper,
};
