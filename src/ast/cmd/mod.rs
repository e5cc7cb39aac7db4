//! Statement nodes and their builders.
//!
//! Builders hold mutable construction state; `build()` freezes them into the
//! plain value types collected under [`Query`].

pub mod compound;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use compound::CompoundSelect;
pub use delete::{Delete, DeleteBuilder};
pub use insert::{ConflictAction, Insert, InsertBuilder, InsertSource, OnConflict};
pub use select::{Select, SelectBuilder};
pub use update::{Update, UpdateBuilder};

use crate::ast::{IntoExpr, Source};

/// Root of every compileable statement tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(Select),
    Compound(CompoundSelect),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl Query {
    /// Start a SELECT with an explicit projection. Add sources with `from`.
    pub fn select<I, T>(columns: I) -> SelectBuilder
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        SelectBuilder::new().columns(columns)
    }

    /// Start a SELECT of every field of `source`.
    pub fn select_from(source: &Source) -> SelectBuilder {
        SelectBuilder::new().from(source)
    }

    pub fn insert(table: &Source) -> InsertBuilder {
        InsertBuilder::new(table)
    }

    pub fn update(table: &Source) -> UpdateBuilder {
        UpdateBuilder::new(table)
    }

    pub fn delete(table: &Source) -> DeleteBuilder {
        DeleteBuilder::new(table)
    }

    /// Names of the result columns, as far as they can be known.
    pub fn output_names(&self) -> Vec<String> {
        match self {
            Query::Select(s) => s.output_names(),
            Query::Compound(c) => c.output_names(),
            Query::Insert(Insert { returning, .. })
            | Query::Update(Update { returning, .. })
            | Query::Delete(Delete { returning, .. }) => {
                returning.iter().filter_map(|e| e.output_name()).collect()
            }
        }
    }

    pub fn as_select(&self) -> Option<&Select> {
        match self {
            Query::Select(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the statement produces rows.
    pub fn returns_rows(&self) -> bool {
        match self {
            Query::Select(_) | Query::Compound(_) => true,
            Query::Insert(Insert { returning, .. })
            | Query::Update(Update { returning, .. })
            | Query::Delete(Delete { returning, .. }) => !returning.is_empty(),
        }
    }
}

macro_rules! into_query {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Query {
                fn from(q: $ty) -> Self {
                    Query::$variant(q.into())
                }
            }
        )*
    };
}

into_query!(
    Select(Select),
    Select(SelectBuilder),
    Compound(CompoundSelect),
    Insert(Insert),
    Insert(InsertBuilder),
    Update(Update),
    Update(UpdateBuilder),
    Delete(Delete),
    Delete(DeleteBuilder),
);
