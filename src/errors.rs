//! Error types for jemstats

use thiserror::Error;

/// Errors produced by schema loading, table resolution, query building and
/// statistical post-processing.
#[derive(Debug, Error)]
pub enum JemstatsError {
    /// Invalid or missing configuration (unknown analysis name, malformed
    /// specification, bad table pattern, missing schema entry)
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// A table pattern matched nothing; carries the available table list
    /// so the caller can self-diagnose without re-querying
    #[error("No tables found matching the pattern '{pattern}'. Available tables are: {}", available.join(", "))]
    NoMatch {
        pattern: String,
        available: Vec<String>,
    },

    /// A table pattern matched more than one table in a single-table analysis
    #[error("Multiple tables match the pattern '{pattern}': {}. Please specify a more precise pattern.", matches.join(", "))]
    AmbiguousMatch {
        pattern: String,
        matches: Vec<String>,
    },

    /// A simple-aggregation metric references a column absent from the
    /// resolved table's schema
    #[error("Column '{column}' not found in schema for table '{table}'")]
    UnknownColumn { column: String, table: String },

    /// The backing store rejected or failed a composed query
    #[error("Query execution failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// A statistical computation that cannot be NULL-guarded (e.g. a
    /// percentile over zero values)
    #[error("Statistical computation failed: {message}")]
    Statistics { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Convenience result type used throughout the crate
pub type Result<T> = std::result::Result<T, JemstatsError>;

/// Helper to create a configuration error
pub fn config_error(message: impl Into<String>, field: Option<&str>) -> JemstatsError {
    JemstatsError::Configuration {
        message: message.into(),
        field: field.map(|f| f.to_string()),
    }
}

/// Helper to create a statistics error
pub fn stats_error(message: impl Into<String>) -> JemstatsError {
    JemstatsError::Statistics {
        message: message.into(),
    }
}
