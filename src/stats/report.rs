//! Comprehensive analysis report aggregating the individual analyses

use crate::db::Store;
use crate::errors::Result;
use crate::stats::{
    ArenaEfficiencyRow, FragmentationRow, LeakRow, LeakStatus, MemoryTrendRow, StatsAnalyzer,
};
use serde::Serialize;

/// Headline numbers derived from the four analyses
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub avg_fragmentation: f64,
    pub peak_memory: f64,
    pub leak_incidents: usize,
    pub efficiency_score: f64,
}

/// The full report. Produced atomically: if any section fails, the whole
/// report fails rather than omitting sections.
#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveReport {
    pub memory_trends: Vec<MemoryTrendRow>,
    pub fragmentation_analysis: Vec<FragmentationRow>,
    pub arena_efficiency: Vec<ArenaEfficiencyRow>,
    pub potential_leaks: Vec<LeakRow>,
    pub summary: ReportSummary,
}

fn mean_of_defined<I: Iterator<Item = Option<f64>>>(values: I) -> f64 {
    let defined: Vec<f64> = values.flatten().collect();
    if defined.is_empty() {
        0.0
    } else {
        defined.iter().sum::<f64>() / defined.len() as f64
    }
}

impl StatsAnalyzer {
    /// Generate a comprehensive analysis report
    pub fn generate_comprehensive_report(
        &self,
        store: &mut Store,
        window_size: usize,
        leak_threshold: f64,
    ) -> Result<ComprehensiveReport> {
        let memory_trends = self.analyze_memory_trends(store, window_size)?;
        let fragmentation_analysis = self.analyze_fragmentation(store)?;
        let arena_efficiency = self.analyze_arena_efficiency(store)?;
        let potential_leaks = self.detect_potential_leaks(store, leak_threshold)?;

        let summary = ReportSummary {
            avg_fragmentation: mean_of_defined(
                fragmentation_analysis
                    .iter()
                    .map(|f| f.fragmentation_ratio),
            ),
            peak_memory: memory_trends
                .iter()
                .map(|t| t.total_allocated)
                .fold(0.0, f64::max),
            leak_incidents: potential_leaks
                .iter()
                .filter(|l| l.status == LeakStatus::PotentialLeak)
                .count(),
            efficiency_score: mean_of_defined(
                arena_efficiency.iter().map(|e| e.dealloc_ratio),
            ),
        };

        Ok(ComprehensiveReport {
            memory_trends,
            fragmentation_analysis,
            arena_efficiency,
            potential_leaks,
            summary,
        })
    }
}
