//! Unit tests for output formatters
//!
//! Tests text and JSON output formatting with various edge cases

use jemstats::db::{QueryResult, Value};
use jemstats::output::json::JsonFormatter;
use jemstats::output::text::TextFormatter;
use jemstats::stats::StatsAnalyzer;

#[path = "../test_data/mod.rs"]
mod test_data;

use test_data::sample_store;

/// Helper to create a small query result with a NULL cell
fn create_test_result() -> QueryResult {
    QueryResult {
        columns: vec!["timestamp".to_string(), "total_allocated".to_string()],
        data: vec![
            vec![
                Value::Text("123456789".to_string()),
                Value::Integer(3000),
            ],
            vec![Value::Text("123456790".to_string()), Value::Null],
        ],
    }
}

mod text_formatter_tests {
    use super::*;

    #[test]
    fn test_table_borders_and_padding() {
        let formatter = TextFormatter::new();
        let output = formatter.format_query_result(&create_test_result()).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "+-----------+-----------------+");
        assert_eq!(lines[1], "| timestamp | total_allocated |");
        assert_eq!(lines[2], lines[0]);
        assert_eq!(lines[3], "| 123456789 | 3000            |");
        // NULL renders as an empty cell
        assert_eq!(lines[4], "| 123456790 |                 |");
        assert_eq!(lines[5], lines[0]);
    }

    #[test]
    fn test_empty_result_still_renders_header() {
        let formatter = TextFormatter::new();
        let result = QueryResult {
            columns: vec!["a".to_string()],
            data: vec![],
        };
        let output = formatter.format_query_result(&result).unwrap();
        assert!(output.contains("| a |"));
    }

    #[test]
    fn test_table_stats_matrix() {
        let mut store = sample_store();
        let stats = StatsAnalyzer::new()
            .calculate_table_stats(&mut store, "bins")
            .unwrap();

        let formatter = TextFormatter::new();
        let output = formatter.format_table_stats("bins", &stats).unwrap();
        assert!(output.starts_with("=== Statistics for bins ==="));
        assert!(output.contains("| metric |"));
        for label in ["min", "max", "avg", "sum", "count", "p50", "p90", "p99"] {
            assert!(output.contains(&format!("| {}", label)), "missing {}", label);
        }
        assert!(output.contains("curslabs"));
    }

    #[test]
    fn test_report_sections() {
        let mut store = sample_store();
        let report = StatsAnalyzer::new()
            .generate_comprehensive_report(&mut store, 5, 10.0)
            .unwrap();

        let formatter = TextFormatter::new();
        let output = formatter.format_report(&report).unwrap();
        assert!(output.contains("Comprehensive Analysis Report"));
        assert!(output.contains("Memory Trends:"));
        assert!(output.contains("Fragmentation Analysis:"));
        assert!(output.contains("Arena Efficiency:"));
        assert!(output.contains("Potential Leaks:"));
        assert!(output.contains("Potential Leak"));
        assert!(output.contains("Leak Incidents: 1"));
    }
}

mod json_formatter_tests {
    use super::*;

    #[test]
    fn test_query_result_round_trips() {
        let formatter = JsonFormatter::new();
        let output = formatter.format_query_result(&create_test_result()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["columns"][1], "total_allocated");
        assert_eq!(parsed["data"][0][1], 3000);
        assert!(parsed["data"][1][1].is_null());
        assert!(parsed.get("metadata").is_none());
    }

    #[test]
    fn test_pretty_and_metadata() {
        let formatter = JsonFormatter::new()
            .with_pretty(true)
            .with_metadata("0.1.0", "test.db");
        let output = formatter.format_query_result(&create_test_result()).unwrap();

        assert!(output.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["metadata"]["version"], "0.1.0");
        assert_eq!(parsed["metadata"]["database"], "test.db");
        assert!(parsed["metadata"]["generated_at"].is_string());
    }

    #[test]
    fn test_report_serialization() {
        let mut store = sample_store();
        let report = StatsAnalyzer::new()
            .generate_comprehensive_report(&mut store, 5, 10.0)
            .unwrap();

        let formatter = JsonFormatter::new();
        let output = formatter.format_report(&report).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["summary"]["leak_incidents"], 1);
        assert_eq!(parsed["potential_leaks"][0]["status"], "Potential Leak");
        // Undefined growth on the first trend point serializes as null
        assert!(parsed["memory_trends"][0]["memory_growth_rate"].is_null());
    }

    #[test]
    fn test_table_stats_serialization() {
        let mut store = sample_store();
        let stats = StatsAnalyzer::new()
            .calculate_table_stats(&mut store, "bins")
            .unwrap();

        let formatter = JsonFormatter::new();
        let output = formatter.format_table_stats("bins", &stats).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["table"], "bins");
        assert_eq!(parsed["statistics"]["curslabs"]["count"], 4);
    }
}
