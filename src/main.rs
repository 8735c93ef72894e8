//! # Promocast
//!
//! Randomized-interval Telegram broadcast daemon.
//!
//! Usage:
//!   promocast                # run the daemon
//!   promocast send           # fire one broadcast cycle now
//!   promocast sweep          # probe all destinations
//!   promocast status         # dashboard snapshot as JSON

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use promocast_channels::{TelegramConfig, TelegramTransport};
use promocast_core::traits::{AssetStore, Storage, Transport};
use promocast_core::AppConfig;
use promocast_scheduler::{dashboard_snapshot, run_sweep, BroadcastCycle, IntervalScheduler};
use promocast_store::{FsAssetStore, SqliteStore};

#[derive(Parser)]
#[command(
    name = "promocast",
    version,
    about = "Randomized-interval Telegram broadcast daemon"
)]
struct Cli {
    /// Path to config.toml (default: ~/.promocast/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the broadcast daemon (default)
    Run,
    /// Fire one broadcast cycle immediately
    Send,
    /// Probe all destinations and record reachability
    Sweep,
    /// Print the dashboard snapshot as JSON
    Status,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "promocast=debug"
    } else {
        "promocast=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let app_config = match &cli.config {
        Some(path) => AppConfig::load_from(Path::new(&expand_path(path)))?,
        None => AppConfig::load()?,
    };
    if app_config.bot_token.is_empty() {
        bail!("no bot token configured; set BOT_TOKEN or bot_token in config.toml");
    }

    let storage: Arc<dyn Storage> =
        Arc::new(SqliteStore::open(Path::new(&expand_path(&app_config.db_path)))?);
    let assets: Arc<dyn AssetStore> = Arc::new(FsAssetStore::new(Path::new(&expand_path(
        &app_config.upload_dir,
    ))));
    let transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(TelegramConfig::new(
        &app_config.bot_token,
    )));

    let cycle = Arc::new(BroadcastCycle::new(
        Arc::clone(&storage),
        Arc::clone(&transport),
        Arc::clone(&assets),
    ));

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            // Arm the timer from the persisted interval bounds; each
            // fire runs one broadcast cycle.
            let broadcast_config = storage.load_config().await?;
            let fire_cycle = Arc::clone(&cycle);
            let scheduler = IntervalScheduler::start(
                broadcast_config.interval_min,
                broadcast_config.interval_max,
                move || {
                    let cycle = Arc::clone(&fire_cycle);
                    async move {
                        cycle.run().await;
                    }
                },
            )?;
            tracing::info!(
                "promocast started: bounds {}..{} minutes, run state {}",
                broadcast_config.interval_min,
                broadcast_config.interval_max,
                broadcast_config.run_state.as_str()
            );
            tokio::signal::ctrl_c().await?;
            tracing::info!("shutting down");
            scheduler.shutdown();
        }
        Command::Send => {
            let outcome = cycle.run().await;
            println!("{outcome:?}");
        }
        Command::Sweep => {
            let report = run_sweep(storage.as_ref(), transport.as_ref()).await?;
            println!(
                "sweep complete: {} reachable, {} failed",
                report.reachable, report.failed
            );
        }
        Command::Status => {
            let snapshot = dashboard_snapshot(storage.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
