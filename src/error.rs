//! Error types for quarry.

use thiserror::Error;

/// The main error type for building, compiling, executing and materializing queries.
#[derive(Debug, Error)]
pub enum QuarryError {
    /// An expression that no dialect gives the intended meaning, e.g. `x = NULL`.
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    /// Join predicate inference found zero or several foreign keys.
    #[error("Cannot infer join from '{from}' to '{to}': {candidates} foreign key(s) connect them, expected exactly 1")]
    JoinResolution {
        from: String,
        to: String,
        candidates: usize,
    },

    /// An expression references a source that is not part of the query's join graph.
    #[error("Source '{0}' is not reachable from the query being compiled")]
    UnboundSource(String),

    /// A query with nothing to select from.
    #[error("Query has no source to select from")]
    EmptyQuery,

    /// The target dialect cannot express the requested construct.
    #[error("{dialect} does not support {feature}")]
    Unsupported {
        dialect: String,
        feature: &'static str,
    },

    /// Output shape cannot be derived from projection and relationship metadata.
    #[error("Projection error: {0}")]
    ProjectionResolution(String),

    /// Rows were not ordered by the parent identity columns.
    #[error("Rows are not ordered by the identity of '{0}': a parent reappeared after its group closed")]
    UnorderedRows(String),

    /// Failed to parse a filter expression.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// The driver returned a value it cannot decode as its column's type.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuarryError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedExpression(message.into())
    }

    pub fn unsupported(dialect: &str, feature: &'static str) -> Self {
        Self::Unsupported {
            dialect: dialect.to_string(),
            feature,
        }
    }

    /// True for errors raised while building or compiling a query tree.
    /// These are programmer errors and are never worth retrying.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedExpression(_)
                | Self::JoinResolution { .. }
                | Self::UnboundSource(_)
                | Self::EmptyQuery
                | Self::Unsupported { .. }
        )
    }
}

impl From<toml::de::Error> for QuarryError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for quarry operations.
pub type QuarryResult<T> = Result<T, QuarryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QuarryError::parse(5, "unexpected character");
        assert_eq!(
            err.to_string(),
            "Parse error at position 5: unexpected character"
        );
    }

    #[test]
    fn test_join_resolution_display() {
        let err = QuarryError::JoinResolution {
            from: "user".into(),
            to: "tweet".into(),
            candidates: 2,
        };
        assert_eq!(
            err.to_string(),
            "Cannot infer join from 'user' to 'tweet': 2 foreign key(s) connect them, expected exactly 1"
        );
    }

    #[test]
    fn test_construction_errors_are_classified() {
        assert!(QuarryError::EmptyQuery.is_construction_error());
        assert!(QuarryError::malformed("x = NULL").is_construction_error());
        assert!(!QuarryError::Execution("timeout".into()).is_construction_error());
    }
}
