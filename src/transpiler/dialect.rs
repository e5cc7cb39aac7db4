//! Dialect selection and the data-only dialect configuration the compiler
//! consumes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuarryError;
use crate::transpiler::sql::{mysql, postgres, sqlite, sqlserver};

/// Supported SQL Dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "sqlite")]
    SQLite,
    #[serde(rename = "sqlserver")]
    SqlServer,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Postgres,
        Dialect::MySQL,
        Dialect::SQLite,
        Dialect::SqlServer,
    ];

    /// The preset configuration for this dialect.
    pub fn config(&self) -> DialectConfig {
        match self {
            Dialect::Postgres => postgres::config(),
            Dialect::MySQL => mysql::config(),
            Dialect::SQLite => sqlite::config(),
            Dialect::SqlServer => sqlserver::config(),
        }
    }

    /// Guess the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Dialect> {
        let scheme = url.split(':').next()?.to_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            "mysql" | "mariadb" => Some(Dialect::MySQL),
            "sqlite" => Some(Dialect::SQLite),
            "mssql" | "sqlserver" => Some(Dialect::SqlServer),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySQL => "mysql",
            Dialect::SQLite => "sqlite",
            Dialect::SqlServer => "sqlserver",
        }
    }
}

impl FromStr for Dialect {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySQL),
            "sqlite" => Ok(Dialect::SQLite),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            other => Err(QuarryError::Config(format!("unknown dialect '{}'", other))),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parameter placeholder syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `?`
    Qmark,
    /// `%s`
    Format,
    /// `$1`, `@p1`, `:1`, ...
    Numbered { prefix: String },
}

/// LIMIT/OFFSET syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum Pagination {
    /// `LIMIT n OFFSET m`. `limit_max` stands in for the limit when only an
    /// offset is given and the dialect cannot express OFFSET alone.
    LimitOffset {
        #[serde(default)]
        limit_max: Option<String>,
    },
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`, which requires an ORDER BY
    OffsetFetch,
}

/// Upsert syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertStyle {
    /// `ON CONFLICT (..) DO NOTHING | DO UPDATE SET ..` with `EXCLUDED.col`
    OnConflict,
    /// `INSERT IGNORE` / `ON DUPLICATE KEY UPDATE ..` with `VALUES(col)`
    OnDuplicateKey,
    Unsupported,
}

/// String concatenation syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum ConcatStyle {
    Operator { symbol: String },
    Function { name: String },
}

/// Bitwise AND/OR syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum BitwiseStyle {
    /// `&` and `|`
    Native,
    /// Function fallback, e.g. `BITAND(a, b)`
    Function { and: String, or: String },
}

/// Everything the compiler needs to know about a target SQL dialect.
///
/// This is plain data; a custom dialect can be declared in `quarry.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialectConfig {
    pub name: String,
    pub quote_open: char,
    pub quote_close: char,
    pub placeholder: PlaceholderStyle,
    pub pagination: Pagination,
    pub true_literal: String,
    pub false_literal: String,
    pub upsert: UpsertStyle,
    pub returning: bool,
    /// Case-sensitive pattern operator
    pub like_operator: String,
    /// Case-insensitive pattern operator; `LOWER(a) LIKE LOWER(b)` when absent
    pub ilike_operator: Option<String>,
    pub concat: ConcatStyle,
    pub bitwise: BitwiseStyle,
    /// Whether compound members may be individually parenthesized
    pub compound_parentheses: bool,
    /// Whether CTE lists take the RECURSIVE keyword
    pub recursive_keyword: bool,
    pub row_locking: bool,
    /// Native `NULLS FIRST/LAST`; emulated with a CASE sort key otherwise
    pub nulls_ordering: bool,
    pub full_join: bool,
    /// Insert clause used when no column has a value
    pub default_values: String,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Dialect::default().config()
    }
}

impl DialectConfig {
    /// Quote an identifier, doubling any embedded closing quote.
    pub fn quote_identifier(&self, name: &str) -> String {
        let close = self.quote_close.to_string();
        let escaped = name.replace(self.quote_close, &close.repeat(2));
        format!("{}{}{}", self.quote_open, escaped, self.quote_close)
    }

    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match &self.placeholder {
            PlaceholderStyle::Qmark => "?".to_string(),
            PlaceholderStyle::Format => "%s".to_string(),
            PlaceholderStyle::Numbered { prefix } => format!("{}{}", prefix, index),
        }
    }

    pub fn bool_literal(&self, val: bool) -> &str {
        if val {
            &self.true_literal
        } else {
            &self.false_literal
        }
    }

    /// Rendered pagination clause, with a leading space. OFFSET/FETCH style
    /// expects the caller to have emitted an ORDER BY already.
    pub fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match &self.pagination {
            Pagination::LimitOffset { limit_max } => {
                let mut sql = String::new();
                match (limit, offset, limit_max) {
                    (Some(n), _, _) => sql.push_str(&format!(" LIMIT {}", n)),
                    (None, Some(_), Some(max)) => sql.push_str(&format!(" LIMIT {}", max)),
                    _ => {}
                }
                if let Some(n) = offset {
                    sql.push_str(&format!(" OFFSET {}", n));
                }
                sql
            }
            Pagination::OffsetFetch => {
                if limit.is_none() && offset.is_none() {
                    return String::new();
                }
                let mut sql = format!(" OFFSET {} ROWS", offset.unwrap_or(0));
                if let Some(n) = limit {
                    sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", n));
                }
                sql
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_str_and_url() {
        assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::MySQL);
        assert!("oracle".parse::<Dialect>().is_err());
        assert_eq!(Dialect::from_url("sqlite::memory:"), Some(Dialect::SQLite));
        assert_eq!(
            Dialect::from_url("postgres://localhost/db"),
            Some(Dialect::Postgres)
        );
        assert_eq!(Dialect::from_url("redis://x"), None);
    }

    #[test]
    fn test_quote_identifier_escapes_closing_quote() {
        let pg = Dialect::Postgres.config();
        assert_eq!(pg.quote_identifier("we\"ird"), "\"we\"\"ird\"");
        let ms = Dialect::SqlServer.config();
        assert_eq!(ms.quote_identifier("a]b"), "[a]]b]");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Postgres.config().placeholder(3), "$3");
        assert_eq!(Dialect::SQLite.config().placeholder(3), "?");
        assert_eq!(Dialect::SqlServer.config().placeholder(2), "@p2");
    }

    #[test]
    fn test_offset_without_limit() {
        assert_eq!(Dialect::Postgres.config().limit_offset(None, Some(5)), " OFFSET 5");
        assert_eq!(
            Dialect::SQLite.config().limit_offset(None, Some(5)),
            " LIMIT -1 OFFSET 5"
        );
        assert_eq!(
            Dialect::SqlServer.config().limit_offset(Some(10), None),
            " OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }

    #[test]
    fn test_config_is_serializable_data() {
        let cfg = Dialect::MySQL.config();
        let text = toml::to_string(&cfg).unwrap();
        let back: DialectConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
