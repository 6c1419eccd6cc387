//! Statistical post-processors for telemetry analysis
//!
//! Every analysis here issues one plain aggregation query and derives the
//! rest in memory, so the math is testable without a store.

pub mod efficiency;
pub mod fragmentation;
pub mod leaks;
pub mod percentiles;
pub mod report;
pub mod trends;

pub use efficiency::{arena_id_from_table, ArenaEfficiencyRow};
pub use fragmentation::FragmentationRow;
pub use leaks::{judge_growth, LeakRow, LeakStatus, DEFAULT_LEAK_THRESHOLD};
pub use percentiles::{column_stats, nearest_rank, ColumnStats, TableStats};
pub use report::{ComprehensiveReport, ReportSummary};
pub use trends::{growth_rates, moving_average, MemoryTrendRow};

use crate::analyzer::{QueryBuilder, TableResolver};
use crate::config::{AggregateOp, Metric, SortKey, SortOrder};
use crate::db::{QueryResult, Store};
use crate::errors::{config_error, Result};

/// Default pattern for per-arena overall statistics tables
pub const DEFAULT_ARENA_TABLE: &str = "arenas_*_overall";
/// Default pattern for the size-class bins table
pub const DEFAULT_BINS_TABLE: &str = "bins";

/// Statistical analyses over allocator telemetry tables.
///
/// The arena and bins table patterns are configurable; defaults match the
/// jemalloc collector's table naming.
pub struct StatsAnalyzer {
    arena_table: String,
    bins_table: String,
}

impl StatsAnalyzer {
    /// Create an analyzer with the default table patterns
    pub fn new() -> Self {
        Self {
            arena_table: DEFAULT_ARENA_TABLE.to_string(),
            bins_table: DEFAULT_BINS_TABLE.to_string(),
        }
    }

    /// Override the arena table pattern
    pub fn with_arena_table(mut self, pattern: impl Into<String>) -> Self {
        self.arena_table = pattern.into();
        self
    }

    /// Override the bins table pattern
    pub fn with_bins_table(mut self, pattern: impl Into<String>) -> Self {
        self.bins_table = pattern.into();
        self
    }

    /// Resolve the arena pattern to exactly one table
    pub(crate) fn resolve_arena_table(&self, store: &mut Store) -> Result<String> {
        TableResolver::new(store.list_tables()?).resolve(&self.arena_table)
    }

    /// Resolve the arena pattern to all matching tables
    pub(crate) fn resolve_arena_tables(&self, store: &mut Store) -> Result<Vec<String>> {
        TableResolver::new(store.list_tables()?).resolve_all(&self.arena_table)
    }

    /// Resolve the bins pattern to exactly one table
    pub(crate) fn resolve_bins_table(&self, store: &mut Store) -> Result<String> {
        TableResolver::new(store.list_tables()?).resolve(&self.bins_table)
    }
}

impl Default for StatsAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// `part * 100 / whole`, undefined (None) when the denominator is zero
pub fn percent_of(part: f64, whole: f64) -> Option<f64> {
    if whole == 0.0 {
        None
    } else {
        Some(part * 100.0 / whole)
    }
}

/// `numerator / denominator`, undefined (None) when the denominator is zero
pub fn ratio_of(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Round to two decimal places, matching the collector's report precision
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Build an aggregation metric over a TEXT telemetry column.
///
/// Values are stored as TEXT by the collector, so every aggregation casts
/// through REAL.
pub(crate) fn cast_metric(operation: AggregateOp, column: &str, name: &str) -> Metric {
    Metric::Expression {
        expression: format!("CAST({} AS REAL)", column),
        operation,
        name: name.to_string(),
        filter: None,
        having: None,
    }
}

/// Ascending sort on the timestamp column
pub(crate) fn timestamp_sort() -> Vec<SortKey> {
    vec![SortKey {
        by: "timestamp".to_string(),
        order: SortOrder::Asc,
    }]
}

/// Run an aggregation query built from expression metrics over one table
pub(crate) fn fetch_aggregation(
    store: &mut Store,
    table: &str,
    metrics: &[Metric],
    groupby: &[String],
    sort: &[SortKey],
) -> Result<QueryResult> {
    let query = QueryBuilder::new(table, None).build(metrics, groupby, sort, &[])?;
    store.fetch(&query)
}

/// Index of a named column in a query result
pub(crate) fn column_index(result: &QueryResult, name: &str) -> Result<usize> {
    result
        .column_index(name)
        .ok_or_else(|| config_error(format!("Result is missing column '{}'", name), None))
}
