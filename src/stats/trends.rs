//! Memory allocation trends over time

use crate::config::AggregateOp;
use crate::db::Store;
use crate::errors::Result;
use crate::stats::{cast_metric, column_index, fetch_aggregation, timestamp_sort, StatsAnalyzer};
use serde::Serialize;

/// One point of the memory trend report
#[derive(Debug, Clone, Serialize)]
pub struct MemoryTrendRow {
    pub timestamp: String,
    pub total_allocated: f64,
    pub total_allocs: f64,
    pub total_deallocs: f64,
    pub moving_avg_memory: f64,
    pub memory_growth_rate: Option<f64>,
}

/// Arithmetic mean over the trailing window of at most `window_size`
/// points including the current one; the leading points use whatever
/// shorter window is available (no padding).
pub fn moving_average(values: &[f64], window_size: usize) -> Vec<f64> {
    let window_size = window_size.max(1);
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let start = (i + 1).saturating_sub(window_size);
            let window = &values[start..=i];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// Percentage change of each point versus its predecessor.
///
/// Undefined (None) for the first point and for any point whose
/// predecessor is exactly zero.
pub fn growth_rates(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &current)| {
            if i == 0 {
                return None;
            }
            let previous = values[i - 1];
            if previous == 0.0 {
                None
            } else {
                Some((current - previous) * 100.0 / previous)
            }
        })
        .collect()
}

impl StatsAnalyzer {
    /// Memory allocation trends: per-timestamp totals with a moving
    /// average and point-to-point growth rate
    pub fn analyze_memory_trends(
        &self,
        store: &mut Store,
        window_size: usize,
    ) -> Result<Vec<MemoryTrendRow>> {
        let table = self.resolve_arena_table(store)?;
        let metrics = vec![
            cast_metric(AggregateOp::Sum, "allocated_0", "total_allocated"),
            cast_metric(AggregateOp::Sum, "nmalloc_1", "total_allocs"),
            cast_metric(AggregateOp::Sum, "ndalloc_3", "total_deallocs"),
        ];
        let result = fetch_aggregation(
            store,
            &table,
            &metrics,
            &["timestamp".to_string()],
            &timestamp_sort(),
        )?;

        let ts = column_index(&result, "timestamp")?;
        let allocated = column_index(&result, "total_allocated")?;
        let allocs = column_index(&result, "total_allocs")?;
        let deallocs = column_index(&result, "total_deallocs")?;

        let totals: Vec<f64> = result
            .data
            .iter()
            .map(|row| row[allocated].as_f64().unwrap_or(0.0))
            .collect();
        let averages = moving_average(&totals, window_size);
        let rates = growth_rates(&totals);

        Ok(result
            .data
            .iter()
            .enumerate()
            .map(|(i, row)| MemoryTrendRow {
                timestamp: row[ts].to_string(),
                total_allocated: totals[i],
                total_allocs: row[allocs].as_f64().unwrap_or(0.0),
                total_deallocs: row[deallocs].as_f64().unwrap_or(0.0),
                moving_avg_memory: averages[i],
                memory_growth_rate: rates[i],
            })
            .collect())
    }
}
