//! JSON output formatter for jemstats results

use crate::db::QueryResult;
use crate::errors::Result;
use crate::stats::{ComprehensiveReport, TableStats};
use chrono::Utc;
use serde_json::{json, Map, Value as JsonValue};

/// JSON formatter for analysis results
pub struct JsonFormatter {
    pretty: bool,
    metadata: Option<JsonValue>,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self {
            pretty: false,
            metadata: None,
        }
    }

    /// Enable or disable pretty-printing
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Attach run metadata (tool version, source database, generation time)
    pub fn with_metadata(mut self, version: &str, database: &str) -> Self {
        self.metadata = Some(json!({
            "version": version,
            "database": database,
            "generated_at": Utc::now().to_rfc3339(),
        }));
        self
    }

    /// Format a query result
    pub fn format_query_result(&self, result: &QueryResult) -> Result<String> {
        self.render(json!({
            "columns": result.columns,
            "data": result.data,
        }))
    }

    /// Format per-column table statistics
    pub fn format_table_stats(&self, table: &str, stats: &TableStats) -> Result<String> {
        let mut columns = Map::new();
        for (name, column_stats) in stats {
            columns.insert(name.clone(), serde_json::to_value(column_stats)?);
        }
        self.render(json!({
            "table": table,
            "statistics": columns,
        }))
    }

    /// Format the comprehensive report
    pub fn format_report(&self, report: &ComprehensiveReport) -> Result<String> {
        self.render(serde_json::to_value(report)?)
    }

    fn render(&self, mut value: JsonValue) -> Result<String> {
        if let (Some(metadata), Some(object)) = (&self.metadata, value.as_object_mut()) {
            object.insert("metadata".to_string(), metadata.clone());
        }
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(rendered)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}
