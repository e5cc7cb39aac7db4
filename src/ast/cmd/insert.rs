//! INSERT nodes, upsert handling and the insert builder.

use crate::ast::{Expr, IntoExpr, Query, Source};
use crate::error::{QuarryError, QuarryResult};

/// A frozen INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: Source,
    pub columns: Vec<String>,
    pub source: InsertSource,
    pub on_conflict: Option<OnConflict>,
    pub returning: Vec<Expr>,
}

/// Where inserted rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// One or more VALUES rows, each as wide as the column list
    Values(Vec<Vec<Expr>>),
    /// INSERT .. SELECT
    Query(Box<Query>),
    DefaultValues,
}

/// Conflict handling for upserts.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    /// Conflict target columns (unique/primary key)
    pub target: Vec<String>,
    pub action: ConflictAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    /// Keep the existing row
    DoNothing,
    /// Update the existing row; values may use [`Expr::Excluded`]
    Update(Vec<(String, Expr)>),
}

impl OnConflict {
    pub fn do_nothing<I, S>(target: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into_iter().map(Into::into).collect(),
            action: ConflictAction::DoNothing,
        }
    }

    /// Overwrite `columns` with the values proposed for insertion.
    pub fn update_excluded<I, S, C, T>(target: I, columns: C) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        C: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            target: target.into_iter().map(Into::into).collect(),
            action: ConflictAction::Update(
                columns
                    .into_iter()
                    .map(|c| {
                        let c = c.into();
                        (c.clone(), Expr::Excluded(c))
                    })
                    .collect(),
            ),
        }
    }

    /// Update with explicit assignments.
    pub fn update<I, S>(target: I, assignments: Vec<(String, Expr)>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into_iter().map(Into::into).collect(),
            action: ConflictAction::Update(assignments),
        }
    }
}

/// Fluent INSERT construction.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: Source,
    columns: Vec<String>,
    rows: Vec<Vec<Expr>>,
    query: Option<Query>,
    on_conflict: Option<OnConflict>,
    returning: Vec<Expr>,
}

impl InsertBuilder {
    pub fn new(table: &Source) -> Self {
        Self {
            table: table.clone(),
            columns: vec![],
            rows: vec![],
            query: None,
            on_conflict: None,
            returning: vec![],
        }
    }

    fn typed(&self, column: &str, value: impl IntoExpr) -> Expr {
        value.into_expr().coerced_to(self.table.field_type(column))
    }

    /// Set one column of a single-row insert.
    pub fn value(mut self, column: &str, value: impl IntoExpr) -> Self {
        let value = self.typed(column, value);
        self.columns.push(column.to_string());
        match self.rows.first_mut() {
            Some(row) => row.push(value),
            None => self.rows.push(vec![value]),
        }
        self
    }

    /// Set the column list for [`InsertBuilder::row`].
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append a VALUES row; its width must match the column list.
    pub fn row<I, T>(mut self, values: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        let row: Vec<Expr> = values
            .into_iter()
            .zip(self.columns.iter().map(Some).chain(std::iter::repeat(None)))
            .map(|(v, col)| match col {
                Some(col) => v.into_expr().coerced_to(self.table.field_type(col)),
                None => v.into_expr(),
            })
            .collect();
        if row.len() != self.columns.len() {
            return Err(QuarryError::malformed(format!(
                "insert row has {} values for {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(self)
    }

    /// INSERT .. SELECT
    pub fn from_query(mut self, query: impl Into<Query>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = Some(on_conflict);
        self
    }

    pub fn returning<I, T>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        self.returning
            .extend(exprs.into_iter().map(IntoExpr::into_expr));
        self
    }

    pub fn build(self) -> Insert {
        let no_values = self.rows.iter().all(Vec::is_empty);
        let source = match (self.query, no_values) {
            (Some(query), _) => InsertSource::Query(Box::new(query)),
            (None, true) => InsertSource::DefaultValues,
            (None, false) => InsertSource::Values(self.rows),
        };
        Insert {
            table: self.table,
            columns: self.columns,
            source,
            on_conflict: self.on_conflict,
            returning: self.returning,
        }
    }
}

impl From<InsertBuilder> for Insert {
    fn from(builder: InsertBuilder) -> Self {
        builder.build()
    }
}
