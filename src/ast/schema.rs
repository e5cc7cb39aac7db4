//! Source descriptions supplied by the mapping layer (or written by hand).
//!
//! These are plain data: a table's fields with their declared types, its
//! primary key and the foreign keys it holds. They drive join inference,
//! literal coercion and object-graph materialization.

use serde::{Deserialize, Serialize};

use crate::ast::SqlType;

/// Description of a table and its relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

/// A single field (column) of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default, rename = "type")]
    pub sql_type: Option<SqlType>,
    #[serde(default)]
    pub nullable: bool,
}

/// `column` of the owning table references `references.referenced_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub references: String,
    #[serde(default = "default_referenced_column")]
    pub referenced_column: String,
    /// Relation name used when materializing nested objects.
    #[serde(default)]
    pub name: Option<String>,
}

fn default_referenced_column() -> String {
    "id".to_string()
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            primary_key: vec![],
            fields: vec![],
            foreign_keys: vec![],
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, sql_type: SqlType) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            sql_type: Some(sql_type),
            nullable: false,
        });
        self
    }

    pub fn nullable_field(mut self, name: impl Into<String>, sql_type: SqlType) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            sql_type: Some(sql_type),
            nullable: true,
        });
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Declare that `column` references `table.referenced_column`.
    pub fn foreign_key(
        mut self,
        column: impl Into<String>,
        table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.into(),
            references: table.into(),
            referenced_column: referenced_column.into(),
            name: None,
        });
        self
    }

    /// Like [`TableDef::foreign_key`] with an explicit relation name.
    pub fn named_foreign_key(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.into(),
            references: table.into(),
            referenced_column: referenced_column.into(),
            name: Some(name.into()),
        });
        self
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_type(&self, name: &str) -> Option<SqlType> {
        self.field_def(name).and_then(|f| f.sql_type)
    }

    /// Foreign keys of this table that point at `table`.
    pub fn foreign_keys_to<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ForeignKey> {
        self.foreign_keys.iter().filter(move |fk| fk.references == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_def_builder() {
        let tweet = TableDef::new("tweet")
            .field("id", SqlType::Integer)
            .field("user_id", SqlType::Integer)
            .nullable_field("content", SqlType::Text)
            .primary_key(["id"])
            .foreign_key("user_id", "user", "id");

        assert_eq!(tweet.field_type("user_id"), Some(SqlType::Integer));
        assert!(tweet.field_def("content").unwrap().nullable);
        assert_eq!(tweet.foreign_keys_to("user").count(), 1);
        assert_eq!(tweet.foreign_keys_to("tag").count(), 0);
    }

    #[test]
    fn test_table_def_from_toml() {
        let def: TableDef = toml::from_str(
            r#"
            name = "tweet"
            primary_key = ["id"]
            fields = [
                { name = "id", type = "integer" },
                { name = "user_id", type = "integer" },
            ]
            foreign_keys = [{ column = "user_id", references = "user" }]
            "#,
        )
        .unwrap();
        assert_eq!(def.foreign_keys[0].referenced_column, "id");
        assert_eq!(def.field_type("id"), Some(SqlType::Integer));
    }
}
