//! Dialect presets.

pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;
