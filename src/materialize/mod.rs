//! Result materialization.
//!
//! A [`Projection`] records where each output column of a query came from.
//! Raw driver rows (ordered scalars) are then turned into one of three shapes:
//!
//! - tuples: the row itself, width-checked
//! - records: `name -> value` maps, duplicate names qualified by source
//! - objects: nested [`Object`] graphs rebuilt along the query's relations,
//!   repeated parent rows collapsed (see [`graph`])

pub mod graph;

use std::collections::{BTreeMap, HashMap};

use crate::ast::{Expr, Query, Relation, Select, Source, Value};
use crate::error::{QuarryError, QuarryResult};

pub use graph::{Object, ObjectIter};

/// One driver row: scalars in projection order.
pub type Row = Vec<Value>;

/// A row keyed by projected name.
pub type Record = BTreeMap<String, Value>;

/// Origin of one output column.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedColumn {
    /// Key used in records and object fields
    pub name: String,
    /// Source the value was read from; `None` for computed expressions
    pub source: Option<Source>,
    /// Field of `source`
    pub field: Option<String>,
}

/// The output columns of a query and the relations connecting their sources.
#[derive(Debug, Clone)]
pub struct Projection {
    columns: Vec<ProjectedColumn>,
    sources: Vec<Source>,
    relations: Vec<Relation>,
}

impl Projection {
    /// Projection of a SELECT: its expanded column list, FROM and join sources,
    /// and the relations its joins follow.
    pub fn of(select: &Select) -> QuarryResult<Self> {
        let sources: Vec<Source> = select.sources().cloned().collect();
        let relations = select
            .joins
            .iter()
            .filter_map(|j| j.relation.clone())
            .collect();
        let columns = select
            .projection()
            .iter()
            .enumerate()
            .map(|(i, e)| resolve(e, i, &sources))
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(Self::new(columns, sources, relations))
    }

    /// Projection of any row-returning statement. Compound selects keep the
    /// names of their first member; DML statements expose RETURNING.
    pub fn from_query(query: &Query) -> QuarryResult<Self> {
        match query {
            Query::Select(select) => Self::of(select),
            Query::Compound(compound) => {
                let columns = compound
                    .output_names()
                    .into_iter()
                    .map(|name| ProjectedColumn {
                        name,
                        source: None,
                        field: None,
                    })
                    .collect();
                Ok(Self::new(columns, vec![], vec![]))
            }
            Query::Insert(insert) => Self::returning(&insert.table, &insert.returning),
            Query::Update(update) => Self::returning(&update.table, &update.returning),
            Query::Delete(delete) => Self::returning(&delete.table, &delete.returning),
        }
    }

    fn returning(table: &Source, exprs: &[Expr]) -> QuarryResult<Self> {
        let sources = vec![table.clone()];
        let columns = exprs
            .iter()
            .enumerate()
            .map(|(i, e)| resolve(e, i, &sources))
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(Self::new(columns, sources, vec![]))
    }

    fn new(mut columns: Vec<ProjectedColumn>, sources: Vec<Source>, relations: Vec<Relation>) -> Self {
        disambiguate(&mut columns);
        Self {
            columns,
            sources,
            relations,
        }
    }

    pub fn columns(&self) -> &[ProjectedColumn] {
        &self.columns
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// FROM entries followed by join targets; the first is the primary source.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub(crate) fn check_width(&self, row: &Row) -> QuarryResult<()> {
        if row.len() != self.width() {
            return Err(QuarryError::ProjectionResolution(format!(
                "row has {} values but the query projects {} columns",
                row.len(),
                self.width()
            )));
        }
        Ok(())
    }

    /// Rows as plain tuples.
    pub fn tuples<I>(&self, rows: I) -> QuarryResult<Vec<Row>>
    where
        I: IntoIterator<Item = Row>,
    {
        rows.into_iter()
            .map(|row| {
                self.check_width(&row)?;
                Ok(row)
            })
            .collect()
    }

    pub fn record(&self, row: Row) -> QuarryResult<Record> {
        self.check_width(&row)?;
        Ok(self
            .columns
            .iter()
            .map(|c| c.name.clone())
            .zip(row)
            .collect())
    }

    /// Rows as name-keyed records.
    pub fn records<I>(&self, rows: I) -> QuarryResult<Vec<Record>>
    where
        I: IntoIterator<Item = Row>,
    {
        rows.into_iter().map(|row| self.record(row)).collect()
    }

    /// Lazily rebuild object graphs. Rows must arrive ordered by the primary
    /// source's identity; see [`ObjectIter`].
    pub fn objects<I>(&self, rows: I) -> QuarryResult<ObjectIter<I::IntoIter>>
    where
        I: IntoIterator<Item = Row>,
    {
        let plan = graph::Plan::build(self)?;
        Ok(ObjectIter::new(plan, self.width(), rows.into_iter()))
    }
}

/// Work out where a projected expression comes from.
fn resolve(expr: &Expr, index: usize, sources: &[Source]) -> QuarryResult<ProjectedColumn> {
    let column = match expr {
        Expr::Column(c) => ProjectedColumn {
            name: c.name.clone(),
            source: Some(c.source.clone()),
            field: Some(c.name.clone()),
        },
        Expr::Alias { expr: inner, name } => match inner.as_ref() {
            Expr::Column(c) => ProjectedColumn {
                name: name.clone(),
                source: Some(c.source.clone()),
                field: Some(c.name.clone()),
            },
            _ => computed(name.clone()),
        },
        Expr::Star(Some(source)) => {
            return Err(QuarryError::ProjectionResolution(format!(
                "'{}.*' has no declared fields to map",
                source.name()
            )));
        }
        Expr::Star(None) => {
            return Err(QuarryError::ProjectionResolution(
                "'*' has no declared fields to map".to_string(),
            ));
        }
        other => computed(
            other
                .output_name()
                .unwrap_or_else(|| format!("column{}", index + 1)),
        ),
    };
    if let Some(source) = &column.source {
        if !sources.contains(source) {
            return Err(QuarryError::ProjectionResolution(format!(
                "column '{}' belongs to '{}', which the query does not read from",
                column.name,
                source.name()
            )));
        }
    }
    Ok(column)
}

fn computed(name: String) -> ProjectedColumn {
    ProjectedColumn {
        name,
        source: None,
        field: None,
    }
}

/// Qualify names that occur more than once as `source.field`; anything still
/// ambiguous (a self-join without explicit aliases) gets a numeric suffix.
fn disambiguate(columns: &mut [ProjectedColumn]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for c in columns.iter() {
        *counts.entry(c.name.clone()).or_default() += 1;
    }
    for c in columns.iter_mut() {
        if counts.get(&c.name).copied().unwrap_or(0) < 2 {
            continue;
        }
        if let (Some(source), Some(field)) = (&c.source, &c.field) {
            c.name = format!("{}.{}", source.alias().unwrap_or(source.name()), field);
        }
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    for c in columns.iter_mut() {
        let n = seen.entry(c.name.clone()).or_default();
        *n += 1;
        if *n > 1 {
            c.name = format!("{}_{}", c.name, n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SqlType, TableDef, count_star};
    use pretty_assertions::assert_eq;

    fn user() -> Source {
        Source::table(
            TableDef::new("user")
                .field("id", SqlType::Integer)
                .field("name", SqlType::Text)
                .primary_key(["id"]),
        )
    }

    fn tweet() -> Source {
        Source::table(
            TableDef::new("tweet")
                .field("id", SqlType::Integer)
                .field("user_id", SqlType::Integer)
                .primary_key(["id"])
                .foreign_key("user_id", "user", "id"),
        )
    }

    #[test]
    fn test_duplicate_names_are_qualified() {
        let (u, t) = (user(), tweet());
        let select = Query::select([u.col("id"), t.col("id"), count_star()])
            .from(&u)
            .join(&t)
            .unwrap()
            .build();
        let projection = Projection::of(&select).unwrap();
        assert_eq!(projection.names(), vec!["user.id", "tweet.id", "count"]);
    }

    #[test]
    fn test_records_and_width() {
        let u = user();
        let projection = Projection::of(&Query::select_from(&u).build()).unwrap();
        let records = projection
            .records(vec![vec![Value::Int(1), Value::from("ann")]])
            .unwrap();
        assert_eq!(records[0]["name"], Value::from("ann"));

        let err = projection.tuples(vec![vec![Value::Int(1)]]).unwrap_err();
        assert!(matches!(err, QuarryError::ProjectionResolution(_)));
    }

    #[test]
    fn test_column_of_foreign_source_is_rejected() {
        let (u, t) = (user(), tweet());
        let select = Query::select([u.col("id"), t.col("id")]).from(&u).build();
        let err = Projection::of(&select).unwrap_err();
        assert!(matches!(err, QuarryError::ProjectionResolution(_)));
    }

    #[test]
    fn test_returning_projection() {
        let u = user();
        let insert = Query::insert(&u)
            .value("name", "ann")
            .returning([u.col("id")])
            .build();
        let projection = Projection::from_query(&Query::Insert(insert)).unwrap();
        assert_eq!(projection.names(), vec!["id"]);
    }

    #[test]
    fn test_self_join_names_get_suffix() {
        let u = user();
        let boss = u.fresh();
        let select = Query::select([u.col("name"), boss.col("name")])
            .from(&u)
            .cross_join(&boss)
            .build();
        let projection = Projection::of(&select).unwrap();
        assert_eq!(projection.names(), vec!["user.name", "user.name_2"]);
    }
}
