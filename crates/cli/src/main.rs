//! geocache command-line entry point.
//!
//! Opens the cache, prints usage statistics and optionally prunes stale
//! entries. Logging goes to stderr so stdout carries only the report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use geocache_core::config::MAX_DAYS;
use geocache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "geocache")]
#[command(version)]
#[command(about = "Inspect and maintain the geocode result cache")]
#[command(long_about = None)]
struct Cli {
    /// Cache database path (overrides config)
    #[arg(short = 'd', long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// Prune entries unused for DAYS days (configured default: 90)
    #[arg(
        long,
        value_name = "DAYS",
        num_args = 0..=1,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_DAYS))
    )]
    prune: Option<Option<u32>>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    /// `--prune` only applies to the statistics report.
    fn check_conflicts(&self) -> Result<(), clap::Error> {
        if self.prune.is_some() && self.command.is_some() {
            return Err(Cli::command().error(
                clap::error::ErrorKind::ArgumentConflict,
                "--prune cannot be used with a subcommand",
            ));
        }
        Ok(())
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the cached payload for an address, if any
    Lookup {
        /// Address to look up (normalized before matching)
        address: String,
    },

    /// Geocode an address, answering from the cache when possible
    Geocode {
        /// Address to geocode
        address: String,

        /// Region bias (ccTLD code, e.g. "us")
        #[arg(long)]
        region: Option<String>,

        /// Response language (e.g. "en")
        #[arg(long)]
        language: Option<String>,

        /// Skip the cache lookup and overwrite the stored payload
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = cli.check_conflicts() {
        e.exit();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache database {}", config.db_path.display()))?;
    tracing::info!("opened geocode cache at {}", config.db_path.display());

    let mut stdout = std::io::stdout().lock();
    let outcome = match cli.command {
        None => {
            let prune_days = cli.prune.map(|days| days.unwrap_or(config.prune_max_age_days));
            commands::report(&db, config.recent_window_days, prune_days, &mut stdout)
                .await
                .map(|report| tracing::debug!(total = report.stats.total, pruned = ?report.pruned, "report complete"))
        }
        Some(Command::Lookup { address }) => commands::lookup(&db, &address, &mut stdout).await.map(|_| ()),
        Some(Command::Geocode { address, region, language, refresh }) => {
            let req = geocache_client::GeocodeRequest { address, region, language };
            commands::geocode(&db, &config, &req, refresh, &mut stdout).await
        }
    };

    if let Err(e) = db.close().await {
        tracing::warn!("failed to close cache database: {}", e);
    }

    outcome
}
