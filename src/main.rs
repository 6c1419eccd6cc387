use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use jemstats::{
    AnalysisConfig, AnalysisExecutor, AnalysisSpec, JsonFormatter, SchemaCatalog, StatsAnalyzer,
    Store, TableResolver, TextFormatter,
};
use log::{debug, info, warn};
use serde_json::json;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Parser)]
#[clap(
    name = "jemstats",
    version,
    about = "A fast jemalloc telemetry statistics analysis tool"
)]
struct Arguments {
    /// Path to the telemetry SQLite database
    #[clap(value_name = "DB_PATH")]
    db_path: PathBuf,

    /// Analysis mode
    #[clap(long, value_enum, default_value = "raw")]
    mode: Mode,

    /// Table pattern to analyze (e.g. "arenas_0*")
    #[clap(long, value_name = "PATTERN")]
    table: Option<String>,

    /// Named analysis from the configuration file (analyze mode)
    #[clap(long, value_name = "NAME")]
    analysis: Option<String>,

    /// Path to the analysis configuration file (JSON)
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the schema catalog file (JSON)
    #[clap(long, value_name = "FILE")]
    schema: Option<PathBuf>,

    /// Filter to a specific snapshot timestamp
    #[clap(long, value_name = "TIMESTAMP")]
    timestamp: Option<String>,

    /// Limit number of rows in raw display
    #[clap(long, value_name = "N", default_value_t = 10)]
    limit: usize,

    /// Moving-average window for trend analysis
    #[clap(long, value_name = "N", default_value_t = 5)]
    window_size: usize,

    /// Growth threshold in percent for leak detection
    #[clap(long, value_name = "PERCENT", default_value_t = 10.0)]
    leak_threshold: f64,

    /// Output format for results
    #[clap(long, value_enum, default_value = "text")]
    output_format: OutputFormat,

    /// Filename for the output; use - for stdout
    #[clap(short = 'o', long, value_name = "outfile")]
    outfile: Option<String>,

    /// Don't print anything to stdout, not even a progress bar
    #[clap(short = 'q', long)]
    quiet: bool,
}

#[derive(Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Print raw table data
    Raw,
    /// Per-table percentile statistics
    Stats,
    /// Cross-arena activity comparison
    Arena,
    /// Metadata summary and available timestamps
    Meta,
    /// Run a named analysis from the configuration file
    Analyze,
    /// Comprehensive report (trends, fragmentation, efficiency, leaks)
    Report,
}

#[derive(Debug, ValueEnum, Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Arguments::parse();
    let start_time = Instant::now();

    validate_arguments(&args)?;

    let mut store = Store::open(&args.db_path)
        .with_context(|| format!("Cannot open database {}", args.db_path.display()))?;
    let catalog = load_schema(&args)?;
    let config = load_config(&args)?;

    info!(
        "Analyzing {} in {:?} mode",
        args.db_path.display(),
        args.mode
    );

    let output = run_mode(&args, &mut store, &catalog, &config)?;
    output_results(&output, &args)?;

    let elapsed = start_time.elapsed();
    if !args.quiet {
        println!("Analysis completed in {:.2}s", elapsed.as_secs_f64());
    }

    Ok(())
}

fn validate_arguments(args: &Arguments) -> anyhow::Result<()> {
    if !args.db_path.exists() {
        bail!("Database file not found: {}", args.db_path.display());
    }

    if args.limit == 0 {
        bail!("Limit must be greater than 0");
    }

    if args.window_size == 0 {
        bail!("Window size must be greater than 0");
    }

    if args.mode == Mode::Analyze {
        if args.analysis.is_none() {
            bail!("Analyze mode requires --analysis");
        }
        if args.config.is_none() {
            bail!("Analyze mode requires --config");
        }
    }

    for (path, flag) in [(&args.config, "--config"), (&args.schema, "--schema")] {
        if let Some(path) = path {
            if !path.exists() {
                bail!("{} file not found: {}", flag, path.display());
            }
        }
    }

    Ok(())
}

fn load_schema(args: &Arguments) -> anyhow::Result<SchemaCatalog> {
    match &args.schema {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Cannot read schema file {}", path.display()))?;
            let catalog = SchemaCatalog::from_str(&content)
                .with_context(|| format!("Invalid schema file {}", path.display()))?;
            debug!("Loaded {} schema entries", catalog.len());
            Ok(catalog)
        }
        None => Ok(SchemaCatalog::new()),
    }
}

fn load_config(args: &Arguments) -> anyhow::Result<AnalysisConfig> {
    match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Cannot read configuration file {}", path.display()))?;
            let config = AnalysisConfig::from_str(&content)
                .with_context(|| format!("Invalid configuration file {}", path.display()))?;
            debug!("Loaded {} analyses", config.analyses.len());
            Ok(config)
        }
        None => Ok(AnalysisConfig::new()),
    }
}

fn run_mode(
    args: &Arguments,
    store: &mut Store,
    catalog: &SchemaCatalog,
    config: &AnalysisConfig,
) -> anyhow::Result<String> {
    match args.mode {
        Mode::Raw => run_raw(args, store),
        Mode::Stats => run_stats(args, store),
        Mode::Arena => run_arena(args, store, catalog, config),
        Mode::Meta => run_meta(args, store),
        Mode::Analyze => run_analyze(args, store, catalog, config),
        Mode::Report => run_report(args, store),
    }
}

fn matching_tables(args: &Arguments, store: &mut Store) -> anyhow::Result<Vec<String>> {
    let resolver = TableResolver::new(store.list_tables()?);
    let pattern = args.table.as_deref().unwrap_or("*");
    let tables = resolver.matching(pattern)?;
    if tables.is_empty() {
        bail!("No tables found matching pattern: {}", pattern);
    }
    Ok(tables)
}

fn run_raw(args: &Arguments, store: &mut Store) -> anyhow::Result<String> {
    let tables = matching_tables(args, store)?;
    let formatter = TextFormatter::new();

    match args.output_format {
        OutputFormat::Text => {
            let mut output = String::new();
            for table in &tables {
                let result = store.table_preview(table, args.limit)?;
                writeln!(output, "=== {} Data ===", table)?;
                writeln!(output, "Showing first {} rows:", args.limit)?;
                output.push_str(&formatter.format_query_result(&result)?);
            }
            Ok(output)
        }
        OutputFormat::Json => {
            let mut parts = Vec::new();
            for table in &tables {
                let result = store.table_preview(table, args.limit)?;
                parts.push(json!({"table": table, "columns": result.columns, "data": result.data}));
            }
            Ok(serde_json::to_string_pretty(&json!(parts))?)
        }
    }
}

fn run_stats(args: &Arguments, store: &mut Store) -> anyhow::Result<String> {
    let tables = matching_tables(args, store)?;
    let analyzer = StatsAnalyzer::new();

    let progress_bar = if !args.quiet {
        Some(create_progress_bar(tables.len() as u64))
    } else {
        None
    };

    let mut sections = Vec::new();
    for (index, table) in tables.iter().enumerate() {
        if let Some(pb) = &progress_bar {
            pb.set_message(format!("Analyzing {}", table));
            pb.set_position(index as u64);
        }

        match analyzer.calculate_table_stats(store, table) {
            Ok(stats) => sections.push((table.clone(), stats)),
            Err(e) => {
                warn!("Skipping {}: {}", table, e);
                continue;
            }
        }
    }

    if let Some(pb) = &progress_bar {
        pb.finish_with_message("Statistics complete");
    }

    if sections.is_empty() {
        bail!("No tables produced statistics");
    }

    match args.output_format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new();
            let mut output = String::new();
            for (table, stats) in &sections {
                output.push_str(&formatter.format_table_stats(table, stats)?);
                output.push('\n');
            }
            Ok(output)
        }
        OutputFormat::Json => {
            let mut parts = Vec::new();
            for (table, stats) in &sections {
                let mut columns = serde_json::Map::new();
                for (name, column_stats) in stats {
                    columns.insert(name.clone(), serde_json::to_value(column_stats)?);
                }
                parts.push(json!({"table": table, "statistics": columns}));
            }
            Ok(serde_json::to_string_pretty(&json!(parts))?)
        }
    }
}

fn run_arena(
    args: &Arguments,
    store: &mut Store,
    catalog: &SchemaCatalog,
    config: &AnalysisConfig,
) -> anyhow::Result<String> {
    let executor = AnalysisExecutor::new(config, catalog);
    let result = match config.analysis("arena_comparison") {
        Some(_) => executor.execute(store, "arena_comparison", args.timestamp.as_deref())?,
        None => {
            let pattern = args.table.as_deref().unwrap_or("arenas_*_overall");
            let spec = AnalysisSpec::builtin_arena_comparison(pattern);
            executor.execute_spec(store, &spec, args.timestamp.as_deref())?
        }
    };

    match args.output_format {
        OutputFormat::Text => Ok(TextFormatter::new().format_query_result(&result)?),
        OutputFormat::Json => Ok(json_formatter(args).format_query_result(&result)?),
    }
}

fn run_meta(args: &Arguments, store: &mut Store) -> anyhow::Result<String> {
    let summary = store.metadata_summary()?;
    let timestamps = store.available_timestamps()?;

    match args.output_format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new();
            let mut output = String::new();
            writeln!(output, "=== Metadata Summary ===")?;
            output.push_str(&formatter.format_query_result(&summary)?);
            writeln!(output, "\n=== Available Timestamps ===")?;
            output.push_str(&formatter.format_query_result(&timestamps)?);
            Ok(output)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
            "summary": summary,
            "timestamps": timestamps,
        }))?),
    }
}

fn run_analyze(
    args: &Arguments,
    store: &mut Store,
    catalog: &SchemaCatalog,
    config: &AnalysisConfig,
) -> anyhow::Result<String> {
    let name = args.analysis.as_deref().expect("validated");
    let executor = AnalysisExecutor::new(config, catalog);
    let result = executor.execute(store, name, args.timestamp.as_deref())?;
    info!("Analysis '{}' returned {} rows", name, result.len());

    match args.output_format {
        OutputFormat::Text => Ok(TextFormatter::new().format_query_result(&result)?),
        OutputFormat::Json => Ok(json_formatter(args).format_query_result(&result)?),
    }
}

fn run_report(args: &Arguments, store: &mut Store) -> anyhow::Result<String> {
    let mut analyzer = StatsAnalyzer::new();
    if let Some(pattern) = &args.table {
        analyzer = analyzer.with_arena_table(pattern.clone());
    }
    let report =
        analyzer.generate_comprehensive_report(store, args.window_size, args.leak_threshold)?;

    match args.output_format {
        OutputFormat::Text => Ok(TextFormatter::new().format_report(&report)?),
        OutputFormat::Json => Ok(json_formatter(args).format_report(&report)?),
    }
}

fn json_formatter(args: &Arguments) -> JsonFormatter {
    JsonFormatter::new()
        .with_pretty(true)
        .with_metadata(env!("CARGO_PKG_VERSION"), &args.db_path.display().to_string())
}

fn output_results(output: &str, args: &Arguments) -> anyhow::Result<()> {
    match &args.outfile {
        Some(outfile) if outfile != "-" => {
            fs::write(outfile, output)?;
            info!("Results written to {}", outfile);
        }
        _ => {
            if !args.quiet || args.outfile.as_deref() == Some("-") {
                println!("{}", output);
            }
        }
    }
    Ok(())
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}
