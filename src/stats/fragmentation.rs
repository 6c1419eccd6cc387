//! Memory fragmentation analysis over size-class bins

use crate::config::AggregateOp;
use crate::db::Store;
use crate::errors::Result;
use crate::stats::{
    cast_metric, column_index, fetch_aggregation, percent_of, timestamp_sort, StatsAnalyzer,
};
use serde::Serialize;

/// Fragmentation metrics for one (snapshot, metadata) group
#[derive(Debug, Clone, Serialize)]
pub struct FragmentationRow {
    pub timestamp: String,
    pub average_utilization: Option<f64>,
    /// Proportion of slabs that are not fully utilized; undefined when the
    /// group has no slabs
    pub fragmentation_ratio: Option<f64>,
    pub total_allocated_regions: f64,
    pub total_slabs: f64,
    pub total_nonfull_slabs: f64,
}

impl StatsAnalyzer {
    /// Fragmentation patterns per (metadata id, timestamp) group of the
    /// bins table
    pub fn analyze_fragmentation(&self, store: &mut Store) -> Result<Vec<FragmentationRow>> {
        let table = self.resolve_bins_table(store)?;
        let metrics = vec![
            cast_metric(AggregateOp::Sum, "curregs", "total_allocated_regions"),
            cast_metric(AggregateOp::Sum, "curslabs", "total_slabs"),
            cast_metric(AggregateOp::Sum, "nonfull_slabs", "total_nonfull_slabs"),
            cast_metric(AggregateOp::Avg, "util", "average_utilization"),
        ];
        let result = fetch_aggregation(
            store,
            &table,
            &metrics,
            &["metadata_id".to_string(), "timestamp".to_string()],
            &timestamp_sort(),
        )?;

        let ts = column_index(&result, "timestamp")?;
        let regions = column_index(&result, "total_allocated_regions")?;
        let slabs = column_index(&result, "total_slabs")?;
        let nonfull = column_index(&result, "total_nonfull_slabs")?;
        let util = column_index(&result, "average_utilization")?;

        Ok(result
            .data
            .iter()
            .map(|row| {
                let total_slabs = row[slabs].as_f64().unwrap_or(0.0);
                let total_nonfull = row[nonfull].as_f64().unwrap_or(0.0);
                FragmentationRow {
                    timestamp: row[ts].to_string(),
                    average_utilization: row[util].as_f64(),
                    fragmentation_ratio: percent_of(total_nonfull, total_slabs),
                    total_allocated_regions: row[regions].as_f64().unwrap_or(0.0),
                    total_slabs,
                    total_nonfull_slabs: total_nonfull,
                }
            })
            .collect())
    }
}
