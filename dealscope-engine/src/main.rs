//! dealscope - run one analytics report against a meetings database
//!
//! Prints the report as JSON on stdout. Logs go to stderr, or to the file
//! named in the `[logging]` config section.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use dealscope_common::config::TomlConfig;
use dealscope_common::db::init_database_pool;
use dealscope_common::time::parse_date;
use dealscope_common::{Clock, FixedClock, SystemClock};
use dealscope_engine::narrative::{DisabledNarrator, HttpNarrator, Narrator};
use dealscope_engine::source::SqliteSource;
use dealscope_engine::{Engine, RecordQuery};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dealscope")]
#[command(about = "Sales meeting analytics: rankings, correlations, outliers and forecasts")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database holding the meetings table
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Compute as if today were this date (YYYY-MM-DD)
    #[arg(long, value_parser = date_arg)]
    today: Option<NaiveDate>,

    /// Insight narrator endpoint
    #[arg(long)]
    narrator_url: Option<String>,

    /// Only meetings on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = date_arg)]
    since: Option<NaiveDate>,

    /// Only meetings on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = date_arg)]
    until: Option<NaiveDate>,

    /// Print compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

fn date_arg(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(value).map_err(|e| e.to_string())
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it carries the log level
    let config = TomlConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config)?;

    info!("Starting dealscope v{}", env!("CARGO_PKG_VERSION"));

    let db_path = config.resolve_database_path(args.database.as_deref());
    info!("Database path: {}", db_path.display());
    let pool = init_database_pool(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let narrator: Box<dyn Narrator> = match config.resolve_narrator_endpoint(args.narrator_url.as_deref()) {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "Narration enabled");
            Box::new(HttpNarrator::new(endpoint, Duration::from_secs(config.narrator.timeout_secs))?)
        }
        None => {
            info!("No narrator endpoint configured, using fallback narratives");
            Box::new(DisabledNarrator)
        }
    };

    let clock: Arc<dyn Clock> = match args.today {
        Some(today) => Arc::new(FixedClock::new(today)),
        None => Arc::new(SystemClock),
    };

    let engine = Engine::new(config.engine.clone(), clock);
    let source = SqliteSource::new(pool);
    let query = RecordQuery::between(args.since, args.until);

    let report = engine.run(&source, narrator.as_ref(), &query).await;

    let json = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", json);

    Ok(())
}
