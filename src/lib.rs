//! # quarry
//!
//! > **Build the tree. Get the SQL.**
//!
//! quarry turns composable expression trees into dialect-correct,
//! parameterized SQL, and turns the rows that come back into records or
//! nested objects.
//!
//! ## Quick Example
//!
//! ```rust
//! use quarry::prelude::*;
//!
//! let user = Source::table(
//!     TableDef::new("user")
//!         .field("id", SqlType::Integer)
//!         .field("active", SqlType::Boolean)
//!         .primary_key(["id"]),
//! );
//! let tweet = Source::table(
//!     TableDef::new("tweet")
//!         .field("id", SqlType::Integer)
//!         .field("user_id", SqlType::Integer)
//!         .foreign_key("user_id", "user", "id"),
//! );
//!
//! let query = Query::select([user.col("id"), tweet.col("id")])
//!     .from(&user)
//!     .join(&tweet)?
//!     .filter(user.col("active").eq(true)?)
//!     .order_by(user.col("id"));
//!
//! let compiled = query.to_sql_for(Dialect::SQLite)?;
//! assert_eq!(
//!     compiled.sql,
//!     r#"SELECT t1."id", t2."id" FROM "user" AS t1 INNER JOIN "tweet" AS t2 ON (t1."id" = t2."user_id") WHERE (t1."active" = ?) ORDER BY t1."id""#
//! );
//! assert_eq!(compiled.params, vec![Value::Bool(true)]);
//! # Ok::<(), quarry::error::QuarryError>(())
//! ```
//!
//! ## Layout
//!
//! | Module          | Role                                               |
//! |-----------------|----------------------------------------------------|
//! | [`ast`]         | sources, expressions, statements and builders      |
//! | [`transpiler`]  | one-pass compiler and dialect presets              |
//! | [`materialize`] | tuples, records and object graphs from raw rows    |
//! | [`engine`]      | executor boundary, sqlx pool, mock executor        |
//! | [`parser`]      | `active = true and age > 30` filters               |
//! | [`config`]      | `quarry.toml`                                      |

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod materialize;
pub mod parser;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::QuarryConfig;
    pub use crate::engine::{Database, Executor, MockExecutor};
    pub use crate::error::*;
    pub use crate::materialize::{Object, Projection, Record, Row};
    pub use crate::parser::{parse_filter, parse_filter_in};
    pub use crate::transpiler::{CompiledQuery, Dialect, DialectConfig, ToSql};
}

/// Compile any statement for a preset dialect.
///
/// # Example
///
/// ```
/// use quarry::ast::{Query, Source, TableDef};
/// use quarry::transpiler::Dialect;
///
/// let user = Source::table(TableDef::new("user"));
/// let compiled = quarry::compile(&Query::delete(&user).into(), Dialect::MySQL).unwrap();
/// assert_eq!(compiled.sql, "DELETE FROM `user`");
/// ```
pub fn compile(
    query: &ast::Query,
    dialect: transpiler::Dialect,
) -> Result<transpiler::CompiledQuery, error::QuarryError> {
    use transpiler::ToSql;
    query.to_sql_for(dialect)
}
