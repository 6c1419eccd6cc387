//! Nearest-rank percentile statistics over a table's numeric columns

use crate::db::Store;
use crate::errors::{stats_error, Result};
use crate::schema::is_identifier_column;
use crate::stats::StatsAnalyzer;
use serde::Serialize;

/// Descriptive statistics for one numeric column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub sum: f64,
    pub count: usize,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
}

/// Per-column statistics, in the table's column order
pub type TableStats = Vec<(String, ColumnStats)>;

/// Nearest-rank percentile over ascending-sorted values.
///
/// Convention: zero-indexed offset `floor(count * p / 100)`, clamped to the
/// last element. For `[1000, 2000]` p50 selects the second value (2000).
/// No interpolation. An empty input fails loudly rather than fabricating a
/// number.
pub fn nearest_rank(sorted: &[f64], percentile: f64) -> Result<f64> {
    if sorted.is_empty() {
        return Err(stats_error(format!(
            "Cannot compute p{} over zero values",
            percentile
        )));
    }
    let offset = (sorted.len() as f64 * percentile / 100.0).floor() as usize;
    Ok(sorted[offset.min(sorted.len() - 1)])
}

/// Statistics over one column's usable (non-NULL, numeric) values
pub fn column_stats(values: &[f64]) -> Result<ColumnStats> {
    if values.is_empty() {
        return Err(stats_error("Cannot compute statistics over zero values"));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let sum: f64 = sorted.iter().sum();
    let count = sorted.len();
    Ok(ColumnStats {
        min: sorted[0],
        max: sorted[count - 1],
        avg: sum / count as f64,
        sum,
        count,
        p50: nearest_rank(&sorted, 50.0)?,
        p90: nearest_rank(&sorted, 90.0)?,
        p99: nearest_rank(&sorted, 99.0)?,
    })
}

impl StatsAnalyzer {
    /// Comprehensive statistics for every metric column of a table.
    ///
    /// Identifier and metadata columns are excluded; the remaining columns
    /// contribute their non-NULL, non-empty numeric values. A column with
    /// no usable values fails the whole computation.
    pub fn calculate_table_stats(&self, store: &mut Store, table: &str) -> Result<TableStats> {
        let result = store.fetch(&format!("SELECT * FROM \"{}\"", table))?;

        let mut stats = Vec::new();
        for (index, column) in result.columns.iter().enumerate() {
            if is_identifier_column(column) {
                continue;
            }
            let values: Vec<f64> = result
                .data
                .iter()
                .filter_map(|row| row[index].as_f64())
                .collect();
            if values.is_empty() {
                return Err(stats_error(format!(
                    "Column '{}' of table '{}' has no numeric values",
                    column, table
                )));
            }
            stats.push((column.clone(), column_stats(&values)?));
        }
        Ok(stats)
    }
}
