//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: SELECT, UPDATE, DELETE, INSERT, aliasing and precedence
//! - `dialects`: dialect-specific rendering (MySQL, SQLite, SQL Server)
//! - `features`: compound selects, CTEs, subqueries, windows, upserts
//! - `properties`: proptest checks for parameter order and parenthesization

mod dialects;
mod features;

use crate::ast::{Source, SqlType, TableDef};

pub(super) fn user() -> Source {
    Source::table(
        TableDef::new("user")
            .field("id", SqlType::Integer)
            .field("username", SqlType::Text)
            .field("active", SqlType::Boolean)
            .primary_key(["id"]),
    )
}

pub(super) fn tweet() -> Source {
    Source::table(
        TableDef::new("tweet")
            .field("id", SqlType::Integer)
            .field("user_id", SqlType::Integer)
            .field("content", SqlType::Text)
            .primary_key(["id"])
            .foreign_key("user_id", "user", "id"),
    )
}
