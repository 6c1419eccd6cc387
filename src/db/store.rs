//! Scoped access to the SQLite telemetry store

use crate::db::{QueryResult, Value};
use crate::errors::Result;
use log::debug;
use rusqlite::{Connection, Transaction};
use std::path::Path;

/// Wrapper around a SQLite connection.
///
/// Every operation runs inside a scoped transaction: commit on success,
/// rollback on any error. That discipline is the only resource-lifetime
/// guarantee the analysis core requires.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open a store backed by a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an in-memory store (used by tests and the example)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Run `f` inside a transaction, committing on success and rolling
    /// back on failure
    pub fn with_cursor<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                // Keep the original failure even if the rollback also fails
                let _ = tx.rollback();
                Err(e)
            }
        }
    }

    /// List all tables in the database
    pub fn list_tables(&mut self) -> Result<Vec<String>> {
        self.with_cursor(|tx| {
            let mut stmt = tx.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(names)
        })
    }

    /// Execute a query and fetch all rows
    pub fn fetch(&mut self, sql: &str) -> Result<QueryResult> {
        self.fetch_with_params(sql, &[])
    }

    /// Execute a parametrized query and fetch all rows.
    ///
    /// Column names come from the prepared statement, so a 0-row result
    /// still carries its columns.
    pub fn fetch_with_params(&mut self, sql: &str, params: &[&str]) -> Result<QueryResult> {
        debug!("Executing query: {}", sql);
        self.with_cursor(|tx| {
            let mut stmt = tx.prepare(sql)?;
            let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

            let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
            let mut data = Vec::new();
            while let Some(row) = rows.next()? {
                let mut cells = Vec::with_capacity(columns.len());
                for i in 0..columns.len() {
                    cells.push(Value::from(row.get_ref(i)?));
                }
                data.push(cells);
            }

            Ok(QueryResult { columns, data })
        })
    }

    /// Execute one or more statements without fetching (fixtures, setup)
    pub fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.with_cursor(|tx| {
            tx.execute_batch(sql)?;
            Ok(())
        })
    }

    /// First `limit` rows of a table, for raw display
    pub fn table_preview(&mut self, table: &str, limit: usize) -> Result<QueryResult> {
        let sql = format!("SELECT * FROM \"{}\" LIMIT {}", table, limit);
        self.fetch(&sql)
    }

    /// Per section/table snapshot counts with first/last seen timestamps,
    /// from the metadata table
    pub fn metadata_summary(&mut self) -> Result<QueryResult> {
        self.fetch(
            "SELECT m.section, m.table_name, COUNT(*) AS count, \
                    MIN(m.timestamp) AS first_seen, MAX(m.timestamp) AS last_seen \
             FROM je_metadata m \
             GROUP BY m.section, m.table_name \
             ORDER BY m.section, m.table_name",
        )
    }

    /// All distinct snapshot timestamps, from the metadata table
    pub fn available_timestamps(&mut self) -> Result<QueryResult> {
        self.fetch("SELECT DISTINCT timestamp FROM je_metadata ORDER BY timestamp")
    }
}
