//! Retail Sales Dashboard CLI
//!
//! Loads a data directory of CSV exports (flat or zip-packed), runs the
//! analytics engine over it, and prints the dashboard report.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sales_analytics::{AnalyticsEngine, AnalyticsError};
use sales_ingest::load_dir;

mod config;
mod sample;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "sales-dash")]
#[command(about = "Retail sales dashboard reporting")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a data directory and print the dashboard report
    Report {
        /// Data directory (defaults to SALES_DATA_DIR or ./data)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Drill into one store
        #[arg(long)]
        store: Option<u32>,

        /// Drill into one state
        #[arg(long)]
        state: Option<String>,

        /// Entries per ranking (defaults to SALES_TOP_N or 10)
        #[arg(long)]
        top: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value = "markdown")]
        format: Format,
    },

    /// Write a randomized sample CSV for demos and smoke tests
    Generate {
        /// Output file
        #[arg(long, default_value = "data/sample.csv")]
        out: PathBuf,

        /// Number of rows to generate
        #[arg(long, default_value = "1000")]
        rows: usize,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Format {
    Markdown,
    Json,
}

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Report {
            data_dir,
            store,
            state,
            top,
            format,
        } => report(
            &data_dir.unwrap_or_else(|| config.data_dir.clone()),
            store,
            state.as_deref(),
            top.unwrap_or(config.top_n),
            format,
        ),
        Command::Generate { out, rows } => sample::generate(&out, rows),
    }
}

fn report(
    data_dir: &std::path::Path,
    store: Option<u32>,
    state: Option<&str>,
    top_n: usize,
    format: Format,
) -> Result<()> {
    info!(data_dir = %data_dir.display(), "loading data directory");

    let outcome = load_dir(data_dir)?;
    for (source, err) in &outcome.skipped {
        warn!(source = %source, error = %err, "source skipped");
    }
    info!(
        sources = outcome.sources.len(),
        rows = outcome.record_set.len(),
        "record set ready"
    );

    let engine = AnalyticsEngine::new(outcome.record_set);

    let report = match engine.generate_report(top_n, store, state) {
        Ok(report) => report,
        Err(AnalyticsError::EmptyScope(scope)) => {
            anyhow::bail!("no data for this selection ({scope})")
        }
        Err(err) => return Err(err.into()),
    };

    match format {
        Format::Markdown => println!("{}", report.to_markdown()),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}
