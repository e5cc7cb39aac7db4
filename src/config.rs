//! `quarry.toml` loading.
//!
//! ```toml
//! [database]
//! url = "postgres://localhost/app"
//! dialect = "postgres"
//! max_connections = 5
//! log_statements = true
//!
//! # Optional overrides on top of the preset named by database.dialect
//! [dialect]
//! true_literal = "1"
//! false_literal = "0"
//!
//! [[tables]]
//! name = "user"
//! primary_key = ["id"]
//! fields = [{ name = "id", type = "integer" }, { name = "name", type = "text" }]
//!
//! [[tables]]
//! name = "tweet"
//! primary_key = ["id"]
//! fields = [{ name = "id", type = "integer" }, { name = "user_id", type = "integer" }]
//! foreign_keys = [{ column = "user_id", references = "user" }]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::{Source, TableDef};
use crate::error::{QuarryError, QuarryResult};
use crate::transpiler::{Dialect, DialectConfig};

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "quarry.toml";

/// Environment variable overriding `database.url`.
pub const DATABASE_URL_ENV: &str = "QUARRY_DATABASE_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarryConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Keys merged over the preset dialect
    #[serde(default)]
    pub dialect: Option<toml::Table>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    /// Preset name; guessed from the URL scheme when absent
    #[serde(default)]
    pub dialect: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub log_statements: bool,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            dialect: None,
            max_connections: default_max_connections(),
            log_statements: false,
        }
    }
}

impl QuarryConfig {
    /// Load the first config found: `path` if given, then `./quarry.toml`,
    /// then the user config directory. Only an explicit path must exist.
    pub fn discover(path: Option<&Path>) -> QuarryResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        for candidate in Self::search_paths() {
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }
        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("quarry").join("config.toml"));
        }
        paths
    }

    pub fn load(path: &Path) -> QuarryResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuarryError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), tables = config.tables.len(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> QuarryResult<Self> {
        toml::from_str(content).map_err(|e| QuarryError::Config(e.to_string()))
    }

    /// Apply `QUARRY_DATABASE_URL` if it is set.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            self.database.url = Some(url);
        }
        self
    }

    /// Preset chosen by `database.dialect`, else by the URL scheme, else Postgres.
    pub fn preset(&self) -> QuarryResult<Dialect> {
        if let Some(name) = &self.database.dialect {
            return name.parse();
        }
        Ok(self
            .database
            .url
            .as_deref()
            .and_then(Dialect::from_url)
            .unwrap_or_default())
    }

    /// The preset with the `[dialect]` table merged over it.
    pub fn dialect_config(&self) -> QuarryResult<DialectConfig> {
        let preset = self.preset()?.config();
        let Some(overrides) = &self.dialect else {
            return Ok(preset);
        };
        let mut merged = toml::Table::try_from(&preset)
            .map_err(|e| QuarryError::Config(e.to_string()))?;
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        merged
            .try_into()
            .map_err(|e: toml::de::Error| QuarryError::Config(format!("[dialect]: {}", e)))
    }

    /// Declared tables as sources, looked up by name.
    pub fn source(&self, name: &str) -> QuarryResult<Source> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .map(Source::table)
            .ok_or_else(|| QuarryError::Config(format!("table '{}' is not declared", name)))
    }
}
