//! Potential memory-leak detection from allocation growth

use crate::config::{AggregateOp, Metric};
use crate::db::Store;
use crate::errors::Result;
use crate::stats::{
    cast_metric, column_index, fetch_aggregation, round2, timestamp_sort, StatsAnalyzer,
};
use serde::Serialize;
use std::fmt;

/// Default growth threshold, in percent, above which a point is flagged
pub const DEFAULT_LEAK_THRESHOLD: f64 = 10.0;

/// Leak judgement for one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LeakStatus {
    Normal,
    #[serde(rename = "Potential Leak")]
    PotentialLeak,
}

impl fmt::Display for LeakStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeakStatus::Normal => write!(f, "Normal"),
            LeakStatus::PotentialLeak => write!(f, "Potential Leak"),
        }
    }
}

/// One judged snapshot. The first snapshot has no predecessor and is
/// excluded from the output rather than emitted with an undefined status.
#[derive(Debug, Clone, Serialize)]
pub struct LeakRow {
    pub timestamp: String,
    pub total_allocated: f64,
    pub net_allocations: f64,
    pub growth_rate: f64,
    pub status: LeakStatus,
}

/// Judge an ordered series of (timestamp, total_allocated, net_allocations)
/// points against a growth threshold.
pub fn judge_growth(
    points: &[(String, f64, f64)],
    threshold_percent: f64,
) -> Vec<LeakRow> {
    let mut rows = Vec::new();
    for window in points.windows(2) {
        let (_, previous, _) = &window[0];
        let (timestamp, current, net) = &window[1];
        // A zero predecessor leaves the growth undefined; skip the point
        if *previous == 0.0 {
            continue;
        }
        let growth_rate = round2((current - previous) * 100.0 / previous);
        let status = if growth_rate > threshold_percent {
            LeakStatus::PotentialLeak
        } else {
            LeakStatus::Normal
        };
        rows.push(LeakRow {
            timestamp: timestamp.clone(),
            total_allocated: *current,
            net_allocations: *net,
            growth_rate,
            status,
        });
    }
    rows
}

impl StatsAnalyzer {
    /// Detect snapshots whose total allocated memory grew faster than
    /// `threshold_percent` versus the preceding snapshot
    pub fn detect_potential_leaks(
        &self,
        store: &mut Store,
        threshold_percent: f64,
    ) -> Result<Vec<LeakRow>> {
        let table = self.resolve_arena_table(store)?;
        let metrics = vec![
            cast_metric(AggregateOp::Sum, "allocated_0", "total_allocated"),
            Metric::Custom {
                formula: "SUM(CAST(nmalloc_1 AS REAL)) - SUM(CAST(ndalloc_3 AS REAL))"
                    .to_string(),
                name: "net_allocations".to_string(),
            },
        ];
        let result = fetch_aggregation(
            store,
            &table,
            &metrics,
            &["timestamp".to_string(), "metadata_id".to_string()],
            &timestamp_sort(),
        )?;

        let ts = column_index(&result, "timestamp")?;
        let allocated = column_index(&result, "total_allocated")?;
        let net = column_index(&result, "net_allocations")?;

        let points: Vec<(String, f64, f64)> = result
            .data
            .iter()
            .map(|row| {
                (
                    row[ts].to_string(),
                    row[allocated].as_f64().unwrap_or(0.0),
                    row[net].as_f64().unwrap_or(0.0),
                )
            })
            .collect();

        Ok(judge_growth(&points, threshold_percent))
    }
}
