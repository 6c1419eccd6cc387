//! Per-arena allocation efficiency metrics

use crate::config::AggregateOp;
use crate::db::Store;
use crate::errors::Result;
use crate::stats::{
    cast_metric, column_index, fetch_aggregation, percent_of, ratio_of, round2, timestamp_sort,
    StatsAnalyzer,
};
use serde::Serialize;

/// Efficiency metrics for one (snapshot, arena) group
#[derive(Debug, Clone, Serialize)]
pub struct ArenaEfficiencyRow {
    pub timestamp: String,
    pub arena_id: i64,
    pub allocated: f64,
    pub allocations: f64,
    pub deallocations: f64,
    pub alloc_rate: f64,
    pub dealloc_rate: f64,
    /// Deallocations as a percentage of allocations; undefined when no
    /// allocations were recorded
    pub dealloc_ratio: Option<f64>,
    /// Undefined when no allocations were recorded
    pub avg_allocation_size: Option<f64>,
}

/// Arena id embedded in a per-arena table name (`arenas_12_overall` -> 12)
pub fn arena_id_from_table(table: &str) -> i64 {
    let digits: String = table
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

impl StatsAnalyzer {
    /// Efficiency metrics for every arena table matching the pattern
    pub fn analyze_arena_efficiency(&self, store: &mut Store) -> Result<Vec<ArenaEfficiencyRow>> {
        let tables = self.resolve_arena_tables(store)?;
        let metrics = vec![
            cast_metric(AggregateOp::Sum, "allocated_0", "allocated"),
            cast_metric(AggregateOp::Sum, "nmalloc_1", "allocations"),
            cast_metric(AggregateOp::Sum, "ndalloc_3", "deallocations"),
            cast_metric(AggregateOp::Sum, "rps_2", "alloc_rate"),
            cast_metric(AggregateOp::Sum, "rps_4", "dealloc_rate"),
        ];

        let mut rows = Vec::new();
        for table in &tables {
            let arena_id = arena_id_from_table(table);
            let result = fetch_aggregation(
                store,
                table,
                &metrics,
                &["metadata_id".to_string(), "timestamp".to_string()],
                &timestamp_sort(),
            )?;

            let ts = column_index(&result, "timestamp")?;
            let allocated = column_index(&result, "allocated")?;
            let allocations = column_index(&result, "allocations")?;
            let deallocations = column_index(&result, "deallocations")?;
            let alloc_rate = column_index(&result, "alloc_rate")?;
            let dealloc_rate = column_index(&result, "dealloc_rate")?;

            for row in &result.data {
                let allocs = row[allocations].as_f64().unwrap_or(0.0);
                let deallocs = row[deallocations].as_f64().unwrap_or(0.0);
                let alloc_bytes = row[allocated].as_f64().unwrap_or(0.0);
                rows.push(ArenaEfficiencyRow {
                    timestamp: row[ts].to_string(),
                    arena_id,
                    allocated: alloc_bytes,
                    allocations: allocs,
                    deallocations: deallocs,
                    alloc_rate: row[alloc_rate].as_f64().unwrap_or(0.0),
                    dealloc_rate: row[dealloc_rate].as_f64().unwrap_or(0.0),
                    dealloc_ratio: percent_of(deallocs, allocs).map(round2),
                    avg_allocation_size: ratio_of(alloc_bytes, allocs).map(round2),
                });
            }
        }

        rows.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.arena_id.cmp(&b.arena_id))
        });
        Ok(rows)
    }
}
