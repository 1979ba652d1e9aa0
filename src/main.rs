//! CLI entry point for the subway ridership dashboard.
//!
//! Loads the ridership table (or the synthetic stand-in), applies the
//! requested filter and prints every dashboard table as JSON for the
//! presentation layer to render.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::io::{BufRead, Write};
use std::path::Path;
use subway_ridership::analyzers::aggregate::filter_options;
use subway_ridership::analyzers::dashboard::{DEFAULT_TOP_N, build_report};
use subway_ridership::filter::{FilterRequest, parse_region_selector};
use subway_ridership::output::{export_records, write_json};
use subway_ridership::source::{DataSource, DatasetCache};
use subway_ridership::synthetic::{DEFAULT_SEED, SyntheticConfig, generate};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_SOURCE: &str = "data/mta_subway_hourly.csv";

#[derive(Parser)]
#[command(name = "subway_ridership")]
#[command(about = "Explore NYC subway ridership by date, borough and station", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every dashboard table for one filter selection
    Report {
        /// Path or URL of the ridership CSV (defaults to $RIDERSHIP_SOURCE)
        #[arg(short, long)]
        source: Option<String>,

        /// First date to include (YYYY-MM-DD), defaults to the earliest date
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date to include (YYYY-MM-DD), defaults to the latest date
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Borough code or name, or "All"
        #[arg(short, long)]
        region: Option<String>,

        /// Station complex name, or "All"
        #[arg(long)]
        station: Option<String>,

        /// Number of stations in the ranking
        #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
        top: usize,
    },
    /// List the dates, boroughs and stations available to filter on
    Options {
        #[arg(short, long)]
        source: Option<String>,

        /// Only list stations in this borough
        #[arg(short, long)]
        region: Option<String>,
    },
    /// Answer one JSON filter request per stdin line with one JSON report per line
    Explore {
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Write the synthetic dataset as input-format CSV
    Generate {
        /// File to write
        #[arg(short, long)]
        output: String,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Gzip compress the output
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/subway_ridership.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("subway_ridership.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut cache = DatasetCache::new(SyntheticConfig::default());

    match cli.command {
        Commands::Report {
            source,
            start,
            end,
            region,
            station,
            top,
        } => {
            let source = resolve_source(source);
            let dataset = cache.get_or_load(&source)?;
            if let Some(notice) = dataset.notice() {
                warn!("{notice}");
            }

            let request = FilterRequest {
                start,
                end,
                region,
                station,
                top: Some(top),
            };
            let filter = request.resolve(dataset.date_bounds())?;
            let report = build_report(&dataset, &filter, top)?;

            info!(
                matched = report.matched_records,
                total_ridership = report.metrics.total_ridership,
                "Report built"
            );
            write_json(std::io::stdout().lock(), &report, true)?;
        }
        Commands::Options { source, region } => {
            let source = resolve_source(source);
            let dataset = cache.get_or_load(&source)?;
            let region = parse_region_selector(region.as_deref())?;

            write_json(
                std::io::stdout().lock(),
                &filter_options(&dataset.records, region),
                true,
            )?;
        }
        Commands::Explore { source } => {
            let source = resolve_source(source);
            explore(&mut cache, &source)?;
        }
        Commands::Generate { output, seed, gzip } => {
            let records = generate(&SyntheticConfig::with_seed(seed))?;
            export_records(&output, &records, gzip)?;
        }
    }

    Ok(())
}

/// Uses `--source` if given, then `$RIDERSHIP_SOURCE`, then the default path.
fn resolve_source(arg: Option<String>) -> DataSource {
    let value = arg
        .or_else(|| std::env::var("RIDERSHIP_SOURCE").ok())
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    DataSource::parse(&value)
}

/// Interactive loop: every stdin line is an independent filter request run
/// against the cached dataset. Bad requests get an error object back instead
/// of ending the session.
#[tracing::instrument(skip_all, fields(source = %source))]
fn explore(cache: &mut DatasetCache, source: &DataSource) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    let mut answered = 0usize;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let dataset = cache.get_or_load(source)?;
        let outcome = serde_json::from_str::<FilterRequest>(&line)
            .map_err(anyhow::Error::from)
            .and_then(|request| {
                let filter = request.resolve(dataset.date_bounds())?;
                Ok(build_report(&dataset, &filter, request.top.unwrap_or(DEFAULT_TOP_N))?)
            });

        match outcome {
            Ok(report) => write_json(&mut stdout, &report, false)?,
            Err(e) => {
                error!(error = %e, "Filter request failed");
                write_json(&mut stdout, &serde_json::json!({ "error": e.to_string() }), false)?;
            }
        }
        answered += 1;
    }

    stdout.flush()?;
    info!(answered, loads = cache.load_count(), "Explore session finished");
    Ok(())
}
