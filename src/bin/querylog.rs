use anyhow::Context;
use clap::Parser;
use querylog::analyzers::{analyzer_for, DatabaseKind, SourceAnalyzer};
use querylog::report::{AnalysisReport, AnalysisRow};
use rayon::prelude::*;
use std::io::{self, BufRead};
use std::sync::Once;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[derive(Parser, Debug)]
#[command(name = "querylog", version, about = "Query-pattern inventory from database query logs")]
struct Cli {
    /// Log files (`-` for stdin). Each file is analysed independently.
    #[arg(required = true)]
    input: Vec<String>,

    /// Source database type
    #[arg(long = "db-type", default_value = "mysql")]
    db_type: String,

    /// Print only a specific section: patterns | tables | summary
    #[arg(long = "only")]
    only: Option<String>,

    #[arg(long = "top")] top: Option<usize>,
    #[arg(long = "min-count")] min_count: Option<usize>,

    /// Patterns output format: json | table (when --only patterns)
    #[arg(long = "format", default_value = "json")]
    format: String,

    #[arg(long = "verbose", short = 'v', default_value_t = false)]
    verbose: bool,
}

fn read_stdin_lines() -> io::Result<Vec<String>> {
    io::stdin().lock().lines().collect()
}

fn analyze_input(analyzer: &SourceAnalyzer, path: &str) -> anyhow::Result<AnalysisReport> {
    if path == "-" {
        let lines = read_stdin_lines().context("reading stdin")?;
        return Ok(analyzer.analyze_lines(&lines));
    }
    let report = analyzer.analyze_file(path)?;
    info!(
        path,
        records = report.summary.total_records,
        patterns = report.summary.unique_patterns,
        "analysed log"
    );
    Ok(report)
}

fn filter_patterns(rows: &mut Vec<AnalysisRow>, cli: &Cli) {
    if let Some(mc) = cli.min_count { rows.retain(|r| r.frequency >= mc); }
    if let Some(top) = cli.top { rows.truncate(top); }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    init_parallelism();

    let kind: DatabaseKind = cli.db_type.parse()?;
    let analyzer = analyzer_for(kind);
    info!(analyzer = analyzer.name(), files = cli.input.len(), "starting analysis");

    let mut reports = cli
        .input
        .par_iter()
        .map(|p| analyze_input(&analyzer, p))
        .collect::<anyhow::Result<Vec<_>>>()?;
    for r in &mut reports {
        filter_patterns(&mut r.patterns, &cli);
    }

    match cli.only.as_deref() {
        Some("patterns") => {
            if cli.format == "table" {
                for r in &reports { print_patterns_table(&r.patterns); }
            } else {
                let pats: Vec<&Vec<AnalysisRow>> = reports.iter().map(|r| &r.patterns).collect();
                print_json(&pats)?;
            }
        }
        Some("tables") => {
            let tables: Vec<_> = reports.iter().map(|r| &r.tables).collect();
            print_json(&tables)?;
        }
        Some("summary") => {
            let summaries: Vec<_> = reports.iter().map(|r| &r.summary).collect();
            print_json(&summaries)?;
        }
        Some(other) => anyhow::bail!("unknown section: {other}"),
        None => print_json(&reports)?,
    }
    Ok(())
}

/// One file prints its value directly; several print as an array in input order.
fn print_json<T: serde::Serialize>(items: &[T]) -> anyhow::Result<()> {
    let out = match items {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    println!("{out}");
    Ok(())
}

fn print_patterns_table(rows: &[AnalysisRow]) {
    println!("{:<8} {:<10} {:<20} {:<20} {}", "Count", "RPS", "Complexity", "Index", "Pattern");
    for r in rows {
        println!(
            "{:<8} {:<10.4} {:<20} {:<20} {}",
            r.frequency, r.calculated_rps, r.complexity_type, r.index_usage_hint, r.query_pattern
        );
    }
}
