//! SQL compiler.
//!
//! Walks a [`Query`] tree once, depth first, and produces parameterized SQL
//! for a [`DialectConfig`]. Parameters are appended in exactly the order their
//! placeholders are written.

pub mod conditions;
pub mod context;
pub mod dialect;
pub mod dml;
pub mod sql;

#[cfg(test)]
mod tests;

use serde::Serialize;
use tracing::debug;

use crate::ast::*;
use crate::error::QuarryResult;
pub use context::Compiler;
pub use dialect::{
    BitwiseStyle, ConcatStyle, Dialect, DialectConfig, Pagination, PlaceholderStyle, UpsertStyle,
};

/// SQL text plus its ordered parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Compile a statement for `dialect`.
pub fn compile(query: &Query, dialect: &DialectConfig) -> QuarryResult<(String, Vec<Value>)> {
    run(dialect, |c| c.query(query))
}

fn run<F>(dialect: &DialectConfig, emit: F) -> QuarryResult<(String, Vec<Value>)>
where
    F: FnOnce(&mut Compiler<'_>) -> QuarryResult<()>,
{
    let mut compiler = Compiler::new(dialect);
    emit(&mut compiler)?;
    let (sql, params) = compiler.finish();
    debug!(dialect = %dialect.name, params = params.len(), "compiled: {}", sql);
    Ok((sql, params))
}

/// Trait for converting statement nodes to SQL.
pub trait ToSql {
    /// Compile for the default dialect (PostgreSQL).
    fn to_sql(&self) -> QuarryResult<CompiledQuery> {
        self.to_sql_for(Dialect::default())
    }

    /// Compile for one of the preset dialects.
    fn to_sql_for(&self, dialect: Dialect) -> QuarryResult<CompiledQuery> {
        self.to_sql_with_dialect(&dialect.config())
    }

    /// Compile for an explicit dialect configuration.
    fn to_sql_with_dialect(&self, dialect: &DialectConfig) -> QuarryResult<CompiledQuery>;
}

macro_rules! to_sql_via {
    ($ty:ty, $method:ident) => {
        impl ToSql for $ty {
            fn to_sql_with_dialect(&self, dialect: &DialectConfig) -> QuarryResult<CompiledQuery> {
                let (sql, params) = run(dialect, |c| c.$method(self))?;
                Ok(CompiledQuery { sql, params })
            }
        }
    };
}

to_sql_via!(Query, query);
to_sql_via!(Select, select);
to_sql_via!(CompoundSelect, compound);
to_sql_via!(Insert, insert);
to_sql_via!(Update, update);
to_sql_via!(Delete, delete);

macro_rules! to_sql_via_build {
    ($($ty:ty),*) => {
        $(
            impl ToSql for $ty {
                fn to_sql_with_dialect(&self, dialect: &DialectConfig) -> QuarryResult<CompiledQuery> {
                    self.clone().build().to_sql_with_dialect(dialect)
                }
            }
        )*
    };
}

to_sql_via_build!(SelectBuilder, InsertBuilder, UpdateBuilder, DeleteBuilder);
