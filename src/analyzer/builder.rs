//! Dynamic query construction from analysis specifications

use crate::config::{Metric, SortKey};
use crate::errors::{JemstatsError, Result};
use crate::schema::TableSchema;

/// Builds the SQL for one analysis against one resolved table.
///
/// The column-existence check on simple aggregations is the only safety
/// net against malformed specifications; expression and custom metrics are
/// trusted configuration. The builder is deterministic: identical inputs
/// yield byte-identical query text.
pub struct QueryBuilder<'a> {
    table: &'a str,
    schema: Option<&'a TableSchema>,
}

impl<'a> QueryBuilder<'a> {
    /// Create a builder for a resolved table and its schema.
    ///
    /// The schema may be omitted when the metrics contain no simple
    /// aggregations (nothing to validate against).
    pub fn new(table: &'a str, schema: Option<&'a TableSchema>) -> Self {
        Self { table, schema }
    }

    /// Compose the full query: SELECT, FROM, WHERE, GROUP BY, HAVING,
    /// ORDER BY.
    ///
    /// `filters` are caller-supplied WHERE conjuncts (e.g. the timestamp
    /// parameter placeholder); expression-metric filters are ANDed after
    /// them in declaration order.
    pub fn build(
        &self,
        metrics: &[Metric],
        groupby: &[String],
        sort: &[SortKey],
        filters: &[String],
    ) -> Result<String> {
        let mut selects = Vec::with_capacity(groupby.len() + metrics.len());
        let mut where_clauses: Vec<String> = filters.to_vec();
        let mut having_clauses: Vec<String> = Vec::new();

        for column in groupby {
            selects.push(quote_ident(column));
        }

        for metric in metrics {
            match metric {
                Metric::Simple {
                    operation,
                    column,
                    name,
                } => {
                    let known = self
                        .schema
                        .map(|s| s.has_column(column))
                        .unwrap_or(false);
                    if !known {
                        return Err(JemstatsError::UnknownColumn {
                            column: column.clone(),
                            table: self.table.to_string(),
                        });
                    }
                    selects.push(format!(
                        "{}({}) AS {}",
                        operation.sql_name(),
                        quote_ident(column),
                        name
                    ));
                }
                Metric::Expression {
                    expression,
                    operation,
                    name,
                    filter,
                    having,
                } => {
                    selects.push(format!("{}({}) AS {}", operation.sql_name(), expression, name));
                    if let Some(filter) = filter {
                        where_clauses.push(filter.clone());
                    }
                    if let Some(having) = having {
                        having_clauses.push(format!("{} {}", name, having));
                    }
                }
                Metric::Custom { formula, name } => {
                    selects.push(format!("{} AS {}", formula, name));
                }
            }
        }

        let mut query = format!(
            "SELECT {} FROM {}",
            selects.join(", "),
            quote_ident(self.table)
        );

        if !where_clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&where_clauses.join(" AND "));
        }

        if !groupby.is_empty() {
            query.push_str(" GROUP BY ");
            query.push_str(
                &groupby
                    .iter()
                    .map(|c| quote_ident(c))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }

        if !having_clauses.is_empty() {
            query.push_str(" HAVING ");
            query.push_str(&having_clauses.join(" AND "));
        }

        if !sort.is_empty() {
            query.push_str(" ORDER BY ");
            query.push_str(
                &sort
                    .iter()
                    .map(|k| format!("{} {}", quote_ident(&k.by), k.order.sql_keyword()))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }

        Ok(query)
    }
}

/// Double-quote a plain identifier (table, column or sort key)
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident)
}
