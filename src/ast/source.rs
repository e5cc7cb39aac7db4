//! Sources rows can be drawn from: tables, subqueries and CTEs.
//!
//! A [`Source`] is a cheap, shareable handle with an identity. Cloning it
//! keeps the identity, so every clone compiles to the same alias within one
//! statement. [`Source::fresh`] and [`Source::aliased`] mint a new identity over
//! the same relation, which is how self-joins are expressed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ast::{Expr, ForeignKey, Query, SqlType, TableDef};

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// What a source draws its rows from.
#[derive(Debug, PartialEq)]
pub enum SourceKind {
    Table(TableDef),
    /// A derived table; rendered as `(SELECT ...) AS alias`
    Subquery(Query),
    /// A common table expression, rendered in the WITH clause and referenced by name
    Cte(CteDef),
}

#[derive(Debug, PartialEq)]
pub struct CteDef {
    pub name: String,
    pub columns: Vec<String>,
    pub query: Query,
    pub recursive: bool,
}

/// Shared, identity-bearing handle to a table, subquery or CTE.
#[derive(Debug, Clone)]
pub struct Source {
    id: u64,
    alias: Option<Arc<str>>,
    kind: Arc<SourceKind>,
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Source {}

impl std::hash::Hash for Source {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Source {
    fn with_kind(kind: SourceKind) -> Self {
        Self {
            id: next_id(),
            alias: None,
            kind: Arc::new(kind),
        }
    }

    pub fn table(def: TableDef) -> Self {
        Self::with_kind(SourceKind::Table(def))
    }

    /// A table known only by name, without field or key metadata.
    pub fn named(name: impl Into<String>) -> Self {
        Self::table(TableDef::new(name))
    }

    pub fn subquery(query: impl Into<Query>) -> Self {
        Self::with_kind(SourceKind::Subquery(query.into()))
    }

    pub fn cte<I, S>(name: impl Into<String>, columns: I, query: impl Into<Query>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(SourceKind::Cte(CteDef {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            query: query.into(),
            recursive: false,
        }))
    }

    /// A `WITH RECURSIVE` CTE. The recursive member refers back to the CTE
    /// through [`Source::named`] with the same name.
    pub fn recursive_cte<I, S>(name: impl Into<String>, columns: I, query: impl Into<Query>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(SourceKind::Cte(CteDef {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            query: query.into(),
            recursive: true,
        }))
    }

    /// A new identity over the same relation, aliased automatically.
    pub fn fresh(&self) -> Self {
        Self {
            id: next_id(),
            alias: None,
            kind: Arc::clone(&self.kind),
        }
    }

    /// A new identity over the same relation with an explicit alias.
    pub fn aliased(&self, alias: impl AsRef<str>) -> Self {
        Self {
            id: next_id(),
            alias: Some(Arc::from(alias.as_ref())),
            kind: Arc::clone(&self.kind),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    /// Table or CTE name; subqueries are reported by their alias or as `subquery`.
    pub fn name(&self) -> &str {
        match self.kind.as_ref() {
            SourceKind::Table(def) => &def.name,
            SourceKind::Cte(cte) => &cte.name,
            SourceKind::Subquery(_) => self.alias().unwrap_or("subquery"),
        }
    }

    pub fn table_def(&self) -> Option<&TableDef> {
        match self.kind.as_ref() {
            SourceKind::Table(def) => Some(def),
            _ => None,
        }
    }

    pub fn cte_def(&self) -> Option<&CteDef> {
        match self.kind.as_ref() {
            SourceKind::Cte(cte) => Some(cte),
            _ => None,
        }
    }

    /// Reference a field of this source.
    pub fn col(&self, name: impl Into<String>) -> Expr {
        let name = name.into();
        let sql_type = self.field_type(&name);
        Expr::Column(ColumnRef {
            source: self.clone(),
            name,
            sql_type,
        })
    }

    /// `alias.*`
    pub fn star(&self) -> Expr {
        Expr::Star(Some(self.clone()))
    }

    pub fn field_type(&self, name: &str) -> Option<SqlType> {
        self.table_def().and_then(|def| def.field_type(name))
    }

    /// Declared field names, in declaration order.
    pub fn field_names(&self) -> Vec<String> {
        match self.kind.as_ref() {
            SourceKind::Table(def) => def.fields.iter().map(|f| f.name.clone()).collect(),
            SourceKind::Cte(cte) => cte.columns.clone(),
            SourceKind::Subquery(query) => query.output_names(),
        }
    }

    pub fn primary_key(&self) -> &[String] {
        self.table_def()
            .map(|def| def.primary_key.as_slice())
            .unwrap_or(&[])
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        self.table_def()
            .map(|def| def.foreign_keys.as_slice())
            .unwrap_or(&[])
    }
}

/// Reference to a named field on a source.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub source: Source,
    pub name: String,
    pub sql_type: Option<SqlType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_keeps_identity_fresh_does_not() {
        let user = Source::named("user");
        let same = user.clone();
        let other = user.fresh();
        assert_eq!(user, same);
        assert_ne!(user, other);
        assert_eq!(other.name(), "user");
    }

    #[test]
    fn test_column_picks_up_declared_type() {
        let user = Source::table(TableDef::new("user").field("active", SqlType::Boolean));
        match user.col("active") {
            Expr::Column(c) => assert_eq!(c.sql_type, Some(SqlType::Boolean)),
            other => panic!("expected column, got {:?}", other),
        }
        match user.col("unknown") {
            Expr::Column(c) => assert_eq!(c.sql_type, None),
            other => panic!("expected column, got {:?}", other),
        }
    }

    #[test]
    fn test_aliased_source() {
        let user = Source::named("user");
        let manager = user.aliased("manager");
        assert_eq!(manager.alias(), Some("manager"));
        assert_eq!(manager.name(), "user");
    }
}
