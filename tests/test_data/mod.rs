//! Shared test fixtures: a sample telemetry database and matching
//! schema/analysis configuration

use jemstats::{AnalysisConfig, SchemaCatalog, Store};

/// DDL + rows for a small two-snapshot telemetry capture
pub const SAMPLE_DB_SQL: &str = "
    CREATE TABLE je_metadata (
        id INTEGER PRIMARY KEY,
        timestamp TEXT,
        section TEXT,
        table_name TEXT
    );

    CREATE TABLE arenas_0_overall (
        metadata_id INTEGER,
        timestamp TEXT,
        primary_0 TEXT,
        allocated_0 TEXT,
        nmalloc_1 TEXT,
        ndalloc_3 TEXT,
        rps_2 TEXT,
        rps_4 TEXT
    );

    CREATE TABLE bins (
        metadata_id INTEGER,
        timestamp TEXT,
        curregs TEXT,
        curslabs TEXT,
        nonfull_slabs TEXT,
        util TEXT
    );

    INSERT INTO je_metadata VALUES (1, '123456789', 'arena', 'arenas_0.overall');
    INSERT INTO je_metadata VALUES (2, '123456790', 'arena', 'arenas_0.overall');

    INSERT INTO arenas_0_overall VALUES
        (1, '123456789', '0', '1000', '500', '300', '50', '30'),
        (1, '123456789', '1', '2000', '1000', '600', '100', '60'),
        (2, '123456790', '0', '1500', '600', '400', '60', '40'),
        (2, '123456790', '1', '2500', '1200', '700', '120', '70');

    INSERT INTO bins VALUES
        (1, '123456789', '100', '10', '2', '80'),
        (1, '123456789', '200', '20', '4', '85'),
        (2, '123456790', '150', '15', '3', '82'),
        (2, '123456790', '250', '25', '5', '87');
";

/// In-memory store populated with the sample capture
pub fn sample_store() -> Store {
    let mut store = Store::open_in_memory().expect("open in-memory store");
    store.execute_batch(SAMPLE_DB_SQL).expect("load sample data");
    store
}

/// Schema catalog covering the sample tables
pub fn sample_catalog() -> SchemaCatalog {
    SchemaCatalog::from_str(
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
            },
            "bins": {
                "columns": [
                    {"name": "metadata_id", "type": "INTEGER"},
                    {"name": "timestamp", "type": "TEXT"},
                    {"name": "curregs", "type": "INTEGER"},
                    {"name": "curslabs", "type": "INTEGER"},
                    {"name": "nonfull_slabs", "type": "INTEGER"},
                    {"name": "util", "type": "REAL"}
                ],
                "primary_key": ["metadata_id", "timestamp"]
            }
        }"#,
    )
    .expect("parse sample catalog")
}

/// Analysis configuration exercising all three metric kinds
pub fn sample_config() -> AnalysisConfig {
    AnalysisConfig::from_str(
        r#"{
            "analyses": {
                "arena_totals": {
                    "table": "arenas_0_*",
                    "metrics": [
                        {"operation": "sum", "column": "allocated_0", "name": "total_allocated"},
                        {"expression": "CAST(nmalloc_1 AS REAL)", "operation": "sum", "name": "total_allocs"},
                        {"formula": "COUNT(*)", "name": "row_count"}
                    ],
                    "groupby": ["timestamp"],
                    "sort": [{"by": "timestamp", "order": "asc"}]
                },
                "bad_column": {
                    "table": "arenas_0_*",
                    "metrics": [
                        {"operation": "sum", "column": "does_not_exist", "name": "broken"}
                    ]
                },
                "arena_comparison": {
                    "table": "arenas_*_overall",
                    "metrics": [
                        {"expression": "CAST(allocated_0 AS REAL)", "operation": "sum", "name": "total_allocated"}
                    ],
                    "special": {"kind": "cross_table_comparison", "share_of": "total_allocated"}
                }
            }
        }"#,
    )
    .expect("parse sample config")
}
