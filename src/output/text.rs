//! Human-readable text output formatter for jemstats results

use crate::db::{QueryResult, Value};
use crate::errors::Result;
use crate::stats::{ComprehensiveReport, TableStats};
use std::fmt::Write;

/// Text formatter rendering bordered console tables and report sections
pub struct TextFormatter {
    // Configuration for text formatting
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self {}
    }

    /// Render a bordered table. NULL cells render empty.
    pub fn format_table(&self, columns: &[String], rows: &[Vec<Value>]) -> Result<String> {
        let str_rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
        for row in &str_rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        let mut output = String::new();
        self.write_separator(&mut output, &widths)?;
        self.write_row(
            &mut output,
            &columns.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
            &widths,
        )?;
        self.write_separator(&mut output, &widths)?;
        for row in &str_rows {
            self.write_row(&mut output, row, &widths)?;
        }
        self.write_separator(&mut output, &widths)?;
        Ok(output)
    }

    /// Render a query result as a bordered table
    pub fn format_query_result(&self, result: &QueryResult) -> Result<String> {
        self.format_table(&result.columns, &result.data)
    }

    /// Render per-column statistics as a metric-by-column matrix
    pub fn format_table_stats(&self, table: &str, stats: &TableStats) -> Result<String> {
        let mut columns = vec!["metric".to_string()];
        columns.extend(stats.iter().map(|(name, _)| name.clone()));

        let metrics: [(&str, fn(&crate::stats::ColumnStats) -> f64); 8] = [
            ("min", |s| s.min),
            ("max", |s| s.max),
            ("avg", |s| s.avg),
            ("sum", |s| s.sum),
            ("count", |s| s.count as f64),
            ("p50", |s| s.p50),
            ("p90", |s| s.p90),
            ("p99", |s| s.p99),
        ];

        let rows: Vec<Vec<Value>> = metrics
            .iter()
            .map(|(label, get)| {
                let mut row = vec![Value::Text(label.to_string())];
                row.extend(stats.iter().map(|(_, s)| Value::Real(get(s))));
                row
            })
            .collect();

        let mut output = String::new();
        writeln!(output, "=== Statistics for {} ===", table)?;
        output.push_str(&self.format_table(&columns, &rows)?);
        Ok(output)
    }

    /// Render the comprehensive report with one section per analysis
    pub fn format_report(&self, report: &ComprehensiveReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "Comprehensive Analysis Report")?;
        writeln!(output, "=============================")?;

        writeln!(output, "\nMemory Trends:")?;
        let columns = string_columns(&[
            "timestamp",
            "total_allocated",
            "total_allocs",
            "total_deallocs",
            "moving_avg_memory",
            "memory_growth_rate",
        ]);
        let rows: Vec<Vec<Value>> = report
            .memory_trends
            .iter()
            .map(|t| {
                vec![
                    Value::Text(t.timestamp.clone()),
                    Value::Real(t.total_allocated),
                    Value::Real(t.total_allocs),
                    Value::Real(t.total_deallocs),
                    Value::Real(t.moving_avg_memory),
                    optional(t.memory_growth_rate),
                ]
            })
            .collect();
        output.push_str(&self.format_table(&columns, &rows)?);

        writeln!(output, "\nFragmentation Analysis:")?;
        let columns = string_columns(&[
            "timestamp",
            "average_utilization",
            "fragmentation_ratio",
            "total_allocated_regions",
            "total_slabs",
            "total_nonfull_slabs",
        ]);
        let rows: Vec<Vec<Value>> = report
            .fragmentation_analysis
            .iter()
            .map(|f| {
                vec![
                    Value::Text(f.timestamp.clone()),
                    optional(f.average_utilization),
                    optional(f.fragmentation_ratio),
                    Value::Real(f.total_allocated_regions),
                    Value::Real(f.total_slabs),
                    Value::Real(f.total_nonfull_slabs),
                ]
            })
            .collect();
        output.push_str(&self.format_table(&columns, &rows)?);

        writeln!(output, "\nArena Efficiency:")?;
        let columns = string_columns(&[
            "timestamp",
            "arena_id",
            "allocated",
            "allocations",
            "deallocations",
            "alloc_rate",
            "dealloc_rate",
            "dealloc_ratio",
            "avg_allocation_size",
        ]);
        let rows: Vec<Vec<Value>> = report
            .arena_efficiency
            .iter()
            .map(|e| {
                vec![
                    Value::Text(e.timestamp.clone()),
                    Value::Integer(e.arena_id),
                    Value::Real(e.allocated),
                    Value::Real(e.allocations),
                    Value::Real(e.deallocations),
                    Value::Real(e.alloc_rate),
                    Value::Real(e.dealloc_rate),
                    optional(e.dealloc_ratio),
                    optional(e.avg_allocation_size),
                ]
            })
            .collect();
        output.push_str(&self.format_table(&columns, &rows)?);

        writeln!(output, "\nPotential Leaks:")?;
        let columns = string_columns(&[
            "timestamp",
            "total_allocated",
            "net_allocations",
            "growth_rate",
            "status",
        ]);
        let rows: Vec<Vec<Value>> = report
            .potential_leaks
            .iter()
            .map(|l| {
                vec![
                    Value::Text(l.timestamp.clone()),
                    Value::Real(l.total_allocated),
                    Value::Real(l.net_allocations),
                    Value::Real(l.growth_rate),
                    Value::Text(l.status.to_string()),
                ]
            })
            .collect();
        output.push_str(&self.format_table(&columns, &rows)?);

        writeln!(output, "\nSummary:")?;
        writeln!(
            output,
            "  Average Fragmentation: {:.2}%",
            report.summary.avg_fragmentation
        )?;
        writeln!(output, "  Peak Memory: {:.0}", report.summary.peak_memory)?;
        writeln!(output, "  Leak Incidents: {}", report.summary.leak_incidents)?;
        writeln!(
            output,
            "  Efficiency Score: {:.2}",
            report.summary.efficiency_score
        )?;

        Ok(output)
    }

    fn write_separator(&self, output: &mut String, widths: &[usize]) -> Result<()> {
        let mut line = String::from("+");
        for width in widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        writeln!(output, "{}", line)?;
        Ok(())
    }

    fn write_row(&self, output: &mut String, row: &[String], widths: &[usize]) -> Result<()> {
        let mut line = String::from("|");
        for (i, width) in widths.iter().enumerate() {
            let cell = row.get(i).map(|c| c.as_str()).unwrap_or("");
            line.push_str(&format!(" {:<width$} |", cell, width = width));
        }
        writeln!(output, "{}", line)?;
        Ok(())
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn string_columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn optional(value: Option<f64>) -> Value {
    match value {
        Some(v) => Value::Real(v),
        None => Value::Null,
    }
}
