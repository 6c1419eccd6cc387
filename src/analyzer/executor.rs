//! Analysis execution: generic single-table path and cross-table comparison

use crate::analyzer::builder::{quote_ident, QueryBuilder};
use crate::analyzer::resolver::TableResolver;
use crate::config::{AnalysisConfig, AnalysisSpec, Metric, SpecialAnalysis};
use crate::db::{QueryResult, Store};
use crate::errors::{config_error, Result};
use crate::schema::SchemaCatalog;
use log::debug;

/// Runs named analysis specifications against the store.
///
/// Rows are returned exactly as fetched; ordering is whatever the
/// specification's sort list declared. The executor never re-sorts.
pub struct AnalysisExecutor<'a> {
    config: &'a AnalysisConfig,
    catalog: &'a SchemaCatalog,
}

impl<'a> AnalysisExecutor<'a> {
    /// Create an executor over a specification collection and schema catalog
    pub fn new(config: &'a AnalysisConfig, catalog: &'a SchemaCatalog) -> Self {
        Self { config, catalog }
    }

    /// Execute the named analysis, optionally filtered to one snapshot
    /// timestamp
    pub fn execute(
        &self,
        store: &mut Store,
        name: &str,
        timestamp: Option<&str>,
    ) -> Result<QueryResult> {
        let spec = self.config.analysis(name).ok_or_else(|| {
            config_error(
                format!("No configuration found for analysis: {}", name),
                Some("analyses"),
            )
        })?;
        self.execute_spec(store, spec, timestamp)
    }

    /// Execute an already-resolved specification
    pub fn execute_spec(
        &self,
        store: &mut Store,
        spec: &AnalysisSpec,
        timestamp: Option<&str>,
    ) -> Result<QueryResult> {
        if spec.metrics.is_empty() {
            return Err(config_error(
                format!("Analysis for table '{}' declares no metrics", spec.table),
                Some("metrics"),
            ));
        }

        let resolver = TableResolver::new(store.list_tables()?);

        match &spec.special {
            Some(SpecialAnalysis::CrossTableComparison {
                share_of,
                discriminator,
            }) => self.execute_comparison(store, &resolver, spec, share_of, discriminator, timestamp),
            None => self.execute_single(store, &resolver, spec, timestamp),
        }
    }

    fn execute_single(
        &self,
        store: &mut Store,
        resolver: &TableResolver,
        spec: &AnalysisSpec,
        timestamp: Option<&str>,
    ) -> Result<QueryResult> {
        let table = resolver.resolve(&spec.table)?;
        let schema = self.schema_for(&table, &spec.metrics)?;

        let filters = timestamp_filters(timestamp);
        let query = QueryBuilder::new(&table, schema).build(
            &spec.metrics,
            &spec.groupby,
            &spec.sort,
            &filters,
        )?;
        debug!("Analysis query for '{}': {}", table, query);

        store.fetch_with_params(&query, &params(timestamp))
    }

    /// Cross-table comparison: one sub-query per matching table behind a
    /// constant discriminator column, UNION ALL inside a CTE, then a share
    /// column computed over the whole union and a descending order on the
    /// shared value.
    fn execute_comparison(
        &self,
        store: &mut Store,
        resolver: &TableResolver,
        spec: &AnalysisSpec,
        share_of: &str,
        discriminator: &str,
        timestamp: Option<&str>,
    ) -> Result<QueryResult> {
        if !spec.metrics.iter().any(|m| m.name() == share_of) {
            return Err(config_error(
                format!("share_of column '{}' is not a declared metric", share_of),
                Some("special"),
            ));
        }

        let tables = resolver.resolve_all(&spec.table)?;
        let filters = timestamp_filters(timestamp);

        let mut sub_queries = Vec::with_capacity(tables.len());
        for table in &tables {
            let schema = self.schema_for(table, &spec.metrics)?;
            let inner = QueryBuilder::new(table, schema).build(
                &spec.metrics,
                &spec.groupby,
                &[],
                &filters,
            )?;
            // Inject the constant discriminator as the leading column
            let body = inner.strip_prefix("SELECT ").unwrap_or(&inner);
            sub_queries.push(format!(
                "SELECT '{}' AS {}, {}",
                table,
                quote_ident(discriminator),
                body
            ));
        }

        let share_name = format!("{}_percent", share_of);
        let query = format!(
            "WITH combined AS ({}) \
             SELECT *, ROUND({} * 100.0 / NULLIF(SUM({}) OVER (), 0), 2) AS {} \
             FROM combined ORDER BY {} DESC",
            sub_queries.join(" UNION ALL "),
            quote_ident(share_of),
            quote_ident(share_of),
            quote_ident(&share_name),
            quote_ident(share_of),
        );
        debug!(
            "Comparison query over {} tables: {}",
            tables.len(),
            query
        );

        store.fetch_with_params(&query, &params(timestamp))
    }

    /// Schema lookup, required only when the metrics contain a simple
    /// aggregation (the only validated kind)
    fn schema_for(
        &self,
        table: &str,
        metrics: &[Metric],
    ) -> Result<Option<&crate::schema::TableSchema>> {
        let schema = self.catalog.schema_for(table);
        let needs_schema = metrics.iter().any(|m| matches!(m, Metric::Simple { .. }));
        if needs_schema && schema.is_none() {
            return Err(config_error(
                format!("No schema found for table: {}", table),
                Some("schema"),
            ));
        }
        Ok(schema)
    }
}

fn timestamp_filters(timestamp: Option<&str>) -> Vec<String> {
    match timestamp {
        Some(_) => vec!["timestamp = ?1".to_string()],
        None => Vec::new(),
    }
}

fn params(timestamp: Option<&str>) -> Vec<&str> {
    timestamp.into_iter().collect()
}
