//! Basic usage example for jemstats
//!
//! This example demonstrates how to use the jemstats library to analyze
//! jemalloc telemetry stored in a SQLite database.

use jemstats::{
    AnalysisConfig, AnalysisExecutor, JsonFormatter, SchemaCatalog, StatsAnalyzer, Store,
    TextFormatter,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("jemstats Basic Usage Example");
    println!("============================");

    // Build a small in-memory telemetry capture (replace with
    // Store::open("telemetry.db") for a real database)
    let mut store = Store::open_in_memory()?;
    store.execute_batch(
        "CREATE TABLE arenas_0_overall (
            metadata_id INTEGER, timestamp TEXT, primary_0 TEXT,
            allocated_0 TEXT, nmalloc_1 TEXT, ndalloc_3 TEXT,
            rps_2 TEXT, rps_4 TEXT
        );
        CREATE TABLE bins (
            metadata_id INTEGER, timestamp TEXT, curregs TEXT,
            curslabs TEXT, nonfull_slabs TEXT, util TEXT
        );
        INSERT INTO arenas_0_overall VALUES
            (1, '100', '0', '1000', '500', '300', '50', '30'),
            (2, '200', '0', '1500', '600', '400', '60', '40');
        INSERT INTO bins VALUES
            (1, '100', '100', '10', '2', '80'),
            (2, '200', '150', '15', '3', '82');",
    )?;

    // Run a declarative analysis
    let config = AnalysisConfig::from_str(
        r#"{
            "analyses": {
                "arena_totals": {
                    "table": "arenas_*_overall",
                    "metrics": [
                        {"operation": "sum", "column": "allocated_0", "name": "total_allocated"}
                    ],
                    "groupby": ["timestamp"],
                    "sort": [{"by": "timestamp", "order": "asc"}]
                }
            }
        }"#,
    )?;
    let catalog = SchemaCatalog::from_str(
        r#"{
            "arenas_*_overall": {
                "columns": [
                    {"name": "metadata_id", "type": "INTEGER"},
                    {"name": "timestamp", "type": "TEXT"},
                    {"name": "primary_0", "type": "TEXT"},
                    {"name": "allocated_0", "type": "INTEGER"},
                    {"name": "nmalloc_1", "type": "INTEGER"},
                    {"name": "ndalloc_3", "type": "INTEGER"},
                    {"name": "rps_2", "type": "INTEGER"},
                    {"name": "rps_4", "type": "INTEGER"}
                ],
                "primary_key": ["metadata_id", "timestamp"]
            }
        }"#,
    )?;

    let executor = AnalysisExecutor::new(&config, &catalog);
    let result = executor.execute(&mut store, "arena_totals", None)?;

    let text_formatter = TextFormatter::new();
    println!("\nArena totals:");
    println!("{}", text_formatter.format_query_result(&result)?);

    // Generate the comprehensive statistics report
    let analyzer = StatsAnalyzer::new();
    let report = analyzer.generate_comprehensive_report(&mut store, 5, 10.0)?;

    println!("Report (text):");
    println!("{}", text_formatter.format_report(&report)?);

    let json_formatter = JsonFormatter::new().with_pretty(true);
    println!("Report (JSON):");
    println!("{}", json_formatter.format_report(&report)?);

    Ok(())
}
