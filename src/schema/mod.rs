//! Schema catalog for telemetry tables
//!
//! The catalog maps table-name patterns to column lists and primary keys.
//! It is loaded once from a JSON description and treated as an immutable
//! value injected into the resolver and query builder.

use crate::errors::{config_error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// Declared type of a telemetry column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

/// A single column declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Schema for one table pattern: ordered columns plus primary-key columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub primary_key: Vec<String>,
}

impl TableSchema {
    /// Ordered column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether the schema declares a column with this name
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

/// Identifier and metadata columns excluded from statistical calculations
pub const IDENTIFIER_COLUMNS: [&str; 5] = ["id", "timestamp", "section", "table_name", "metadata_id"];

/// Whether a column is an identifier/metadata column rather than a metric
pub fn is_identifier_column(name: &str) -> bool {
    IDENTIFIER_COLUMNS.contains(&name)
}

/// Catalog of table schemas keyed by table-name pattern.
///
/// One entry may match multiple physical tables via pattern matching.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SchemaCatalog {
    entries: BTreeMap<String, TableSchema>,
}

impl SchemaCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON string
    pub fn from_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a catalog from a JSON reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Insert an entry, replacing any existing entry for the same pattern
    pub fn insert(&mut self, pattern: impl Into<String>, schema: TableSchema) {
        self.entries.insert(pattern.into(), schema);
    }

    /// Number of catalog entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the schema for a physical table name.
    ///
    /// Exact keys win; otherwise the first entry whose pattern matches the
    /// table name is returned.
    pub fn schema_for(&self, table_name: &str) -> Option<&TableSchema> {
        if let Some(schema) = self.entries.get(table_name) {
            return Some(schema);
        }
        self.entries.iter().find_map(|(pattern, schema)| {
            match pattern_to_regex(pattern) {
                Ok(re) if re.is_match(table_name) => Some(schema),
                _ => None,
            }
        })
    }
}

/// Translate a table pattern into an anchored regex.
///
/// A bare `*` becomes `.*` so glob-style patterns work; a `*` already
/// preceded by `.` is left alone so real regexes pass through unchanged.
pub fn pattern_to_regex(pattern: &str) -> Result<Regex> {
    let mut translated = String::with_capacity(pattern.len() + 4);
    translated.push('^');
    let mut prev = '\0';
    for ch in pattern.chars() {
        if ch == '*' && prev != '.' {
            translated.push_str(".*");
        } else {
            translated.push(ch);
        }
        prev = ch;
    }
    translated.push('$');
    Regex::new(&translated)
        .map_err(|e| config_error(format!("Invalid table pattern '{}': {}", pattern, e), Some("table")))
}
