//! Unit tests for table resolution, query building and analysis execution

use jemstats::{AnalysisExecutor, JemstatsError, Store, TableResolver, Value};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

#[path = "../test_data/mod.rs"]
mod test_data;

use test_data::{sample_catalog, sample_config, sample_store};

fn executor_fixtures() -> (Store, jemstats::AnalysisConfig, jemstats::SchemaCatalog) {
    (sample_store(), sample_config(), sample_catalog())
}

#[test]
fn test_generic_analysis_end_to_end() {
    let (mut store, config, catalog) = executor_fixtures();
    let executor = AnalysisExecutor::new(&config, &catalog);

    let result = executor.execute(&mut store, "arena_totals", None).unwrap();
    assert_eq!(
        result.columns,
        vec!["timestamp", "total_allocated", "total_allocs", "row_count"]
    );
    assert_eq!(result.len(), 2);

    // First snapshot: 1000 + 2000 allocated over two rows
    assert_eq!(result.data[0][0], Value::Text("123456789".to_string()));
    assert_eq!(result.data[0][1].as_f64(), Some(3000.0));
    assert_eq!(result.data[0][2].as_f64(), Some(1500.0));
    assert_eq!(result.data[0][3], Value::Integer(2));

    // Second snapshot: 1500 + 2500
    assert_eq!(result.data[1][1].as_f64(), Some(4000.0));
}

#[test]
fn test_unknown_analysis_is_configuration_error() {
    let (mut store, config, catalog) = executor_fixtures();
    let executor = AnalysisExecutor::new(&config, &catalog);

    match executor.execute(&mut store, "missing", None) {
        Err(JemstatsError::Configuration { message, .. }) => {
            assert!(message.contains("missing"));
        }
        other => panic!("expected Configuration error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_unknown_column_rejected() {
    let (mut store, config, catalog) = executor_fixtures();
    let executor = AnalysisExecutor::new(&config, &catalog);

    match executor.execute(&mut store, "bad_column", None) {
        Err(JemstatsError::UnknownColumn { column, table }) => {
            assert_eq!(column, "does_not_exist");
            assert_eq!(table, "arenas_0_overall");
        }
        other => panic!("expected UnknownColumn, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_timestamp_filter_is_applied() {
    let (mut store, config, catalog) = executor_fixtures();
    let executor = AnalysisExecutor::new(&config, &catalog);

    let result = executor
        .execute(&mut store, "arena_totals", Some("123456790"))
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.data[0][0], Value::Text("123456790".to_string()));
    assert_eq!(result.data[0][1].as_f64(), Some(4000.0));
}

#[test]
fn test_comparison_shares_sum_to_100() {
    let (mut store, config, catalog) = executor_fixtures();

    // A second same-shaped arena table so the pattern matches two tables
    store
        .execute_batch(
            "CREATE TABLE arenas_1_overall (
                metadata_id INTEGER,
                timestamp TEXT,
                primary_0 TEXT,
                allocated_0 TEXT,
                nmalloc_1 TEXT,
                ndalloc_3 TEXT,
                rps_2 TEXT,
                rps_4 TEXT
            );
            INSERT INTO arenas_1_overall VALUES
                (1, '123456789', '0', '3000', '700', '500', '70', '50');",
        )
        .unwrap();

    let executor = AnalysisExecutor::new(&config, &catalog);
    let result = executor
        .execute(&mut store, "arena_comparison", Some("123456789"))
        .unwrap();

    assert_eq!(
        result.columns,
        vec!["table_name", "total_allocated", "total_allocated_percent"]
    );
    assert_eq!(result.len(), 2);

    // Ordered by total_allocated descending: arena 1 (3000) then arena 0 (3000 at ts1)
    let shares: Vec<f64> = result
        .data
        .iter()
        .map(|row| row[2].as_f64().unwrap())
        .collect();
    assert!((shares.iter().sum::<f64>() - 100.0).abs() < 0.02);

    let values: Vec<f64> = result
        .data
        .iter()
        .map(|row| row[1].as_f64().unwrap())
        .collect();
    assert!(values[0] >= values[1]);
}

#[test]
fn test_comparison_requires_matching_tables() {
    let (mut store, config, catalog) = executor_fixtures();
    store.execute_batch("DROP TABLE arenas_0_overall;").unwrap();

    let executor = AnalysisExecutor::new(&config, &catalog);
    match executor.execute(&mut store, "arena_comparison", None) {
        Err(JemstatsError::NoMatch { pattern, available }) => {
            assert_eq!(pattern, "arenas_*_overall");
            assert!(available.contains(&"bins".to_string()));
        }
        other => panic!("expected NoMatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_ambiguous_pattern_in_generic_analysis() {
    let mut store = sample_store();
    store
        .execute_batch("CREATE TABLE arenas_0_extra (metadata_id INTEGER);")
        .unwrap();

    let resolver = TableResolver::new(store.list_tables().unwrap());
    match resolver.resolve("arenas_0_*") {
        Err(JemstatsError::AmbiguousMatch { matches, .. }) => {
            assert_eq!(matches.len(), 2);
        }
        other => panic!("expected AmbiguousMatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_built_queries_parse_as_sql() {
    use jemstats::QueryBuilder;
    use jemstats::{AggregateOp, Metric, SortKey, SortOrder};

    let catalog = sample_catalog();
    let schema = catalog.schema_for("arenas_0_overall").unwrap();
    let builder = QueryBuilder::new("arenas_0_overall", Some(schema));

    let metrics = vec![
        Metric::Simple {
            operation: AggregateOp::Sum,
            column: "allocated_0".to_string(),
            name: "total_allocated".to_string(),
        },
        Metric::Expression {
            expression: "CAST(nmalloc_1 AS REAL)".to_string(),
            operation: AggregateOp::Avg,
            name: "avg_allocs".to_string(),
            filter: Some("nmalloc_1 IS NOT NULL".to_string()),
            having: Some("> 0".to_string()),
        },
    ];
    let sort = vec![SortKey {
        by: "timestamp".to_string(),
        order: SortOrder::Desc,
    }];
    let query = builder
        .build(
            &metrics,
            &["timestamp".to_string()],
            &sort,
            &["timestamp = '123456789'".to_string()],
        )
        .unwrap();

    let parsed = Parser::parse_sql(&SQLiteDialect {}, &query);
    assert!(parsed.is_ok(), "built SQL failed to parse: {}", query);
    assert_eq!(parsed.unwrap().len(), 1);
}
