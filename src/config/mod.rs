//! Analysis specification configuration
//!
//! Analyses are declarative: a table pattern, a list of metric descriptors,
//! optional group-by columns, an optional sort list and an optional special
//! execution marker. The collection is deserialized from JSON once and
//! injected into the executor as a read-only value.

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

/// Aggregation operations supported by simple and expression metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggregateOp {
    /// SQL function name for this operation
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateOp::Sum => "SUM",
            AggregateOp::Avg => "AVG",
            AggregateOp::Min => "MIN",
            AggregateOp::Max => "MAX",
            AggregateOp::Count => "COUNT",
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_name())
    }
}

/// A metric descriptor.
///
/// Only the `Custom` variant carries unescaped raw text; `Simple` columns
/// are validated against the resolved table schema before any query runs.
/// Expression and custom metrics are trusted configuration by design.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    /// An aggregation over a row-level formula, with optional row filter
    /// and having predicate
    Expression {
        expression: String,
        operation: AggregateOp,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        having: Option<String>,
    },
    /// A raw formula emitted verbatim
    Custom { formula: String, name: String },
    /// An aggregation over a single schema column
    Simple {
        operation: AggregateOp,
        column: String,
        name: String,
    },
}

impl Metric {
    /// Output column name of this metric
    pub fn name(&self) -> &str {
        match self {
            Metric::Expression { name, .. } => name,
            Metric::Custom { name, .. } => name,
            Metric::Simple { name, .. } => name,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One ORDER BY key; multiple keys apply left to right
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortKey {
    pub by: String,
    #[serde(default)]
    pub order: SortOrder,
}

/// Marker selecting a non-generic execution path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecialAnalysis {
    /// Resolve every table matching the pattern, aggregate each behind a
    /// constant discriminator column, UNION ALL the sub-queries and compute
    /// each row's percentage share of `share_of` across the union
    CrossTableComparison {
        share_of: String,
        #[serde(default = "default_discriminator")]
        discriminator: String,
    },
}

fn default_discriminator() -> String {
    "table_name".to_string()
}

/// A named analysis specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSpec {
    pub table: String,
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub groupby: Vec<String>,
    #[serde(default)]
    pub sort: Vec<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<SpecialAnalysis>,
}

impl AnalysisSpec {
    /// Built-in cross-table arena comparison used when no configuration
    /// file declares one. Expression metrics carry the REAL casts, so no
    /// schema entry is required.
    pub fn builtin_arena_comparison(table_pattern: &str) -> Self {
        let sum = |expr: &str, name: &str| Metric::Expression {
            expression: expr.to_string(),
            operation: AggregateOp::Sum,
            name: name.to_string(),
            filter: None,
            having: None,
        };

        AnalysisSpec {
            table: table_pattern.to_string(),
            metrics: vec![
                sum("CAST(allocated_0 AS REAL)", "total_allocated"),
                sum("CAST(nmalloc_1 AS REAL)", "total_allocs"),
                sum("CAST(ndalloc_3 AS REAL)", "total_deallocs"),
                sum("CAST(rps_2 AS REAL)", "alloc_rps"),
                sum("CAST(rps_4 AS REAL)", "dealloc_rps"),
            ],
            groupby: vec!["timestamp".to_string(), "metadata_id".to_string()],
            sort: Vec::new(),
            special: Some(SpecialAnalysis::CrossTableComparison {
                share_of: "total_allocated".to_string(),
                discriminator: default_discriminator(),
            }),
        }
    }
}

/// Collection of named analysis specifications
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfig {
    pub analyses: BTreeMap<String, AnalysisSpec>,
}

impl AnalysisConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON string
    pub fn from_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Look up a named analysis
    pub fn analysis(&self, name: &str) -> Option<&AnalysisSpec> {
        self.analyses.get(name)
    }
}
