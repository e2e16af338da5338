//! slotwatch CLI
//!
//! Local execution entry point. For AWS Lambda, use `slotwatch-lambda`.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use slotwatch::{
    error::Result,
    models::Config,
    pipeline::{self, Watcher},
    services::SlotParser,
    storage::{LocalStorage, MemoryStorage, SnapshotStore},
};

/// slotwatch - Driving lesson slot watcher
#[derive(Parser, Debug)]
#[command(
    name = "slotwatch",
    version,
    about = "Notifies about newly published driving lesson slots"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Snapshot directory (overrides `storage.dir`)
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single fetch → parse → diff → notify pass
    Tick {
        /// Use a throwaway in-memory snapshot and log the message instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Run ticks on a fixed interval until Ctrl-C
    Watch {
        /// Seconds between ticks (default: `schedule.interval_secs`)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Parse a saved page and print the entries as JSON
    Parse {
        /// HTML file, or `-` for stdin
        input: PathBuf,
    },

    /// Validate configuration
    Validate,

    /// Show the stored snapshot
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    if let Some(dir) = cli.storage_dir {
        config.storage.dir = dir;
    }

    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Tick { dry_run } => {
            let store: Arc<dyn SnapshotStore> = if dry_run {
                Arc::new(MemoryStorage::new())
            } else {
                Arc::new(LocalStorage::new(&config.storage.dir))
            };
            let watcher = Watcher::from_config(&config, store, dry_run)?;
            let report = watcher.tick().await?;
            log::info!(
                "Done: {} listed, {} new, {} removed, notified={}",
                report.total,
                report.new,
                report.removed,
                report.notified
            );
        }

        Command::Watch { interval } => {
            let store: Arc<dyn SnapshotStore> = Arc::new(LocalStorage::new(&config.storage.dir));
            let watcher = Watcher::from_config(&config, store, false)?;
            let period = Duration::from_secs(interval.unwrap_or(config.schedule.interval_secs).max(1));

            log::info!(
                "Watching {} every {}s (Ctrl-C to stop)",
                config.source.url,
                period.as_secs()
            );
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Cannot listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            let stats = pipeline::run_every(&watcher, period, shutdown).await;
            log::info!(
                "Stopped after {} ticks ({} failed, {} notifications)",
                stats.ticks,
                stats.failures,
                stats.notifications
            );
        }

        Command::Parse { input } => {
            let html = if input.as_os_str() == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&input)?
            };

            let parser = SlotParser::from_config(&config.selectors, &config.source.url)?;
            let entries = parser.parse(&html)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
            log::info!("Parsed {} entries", entries.len());
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            SlotParser::from_config(&config.selectors, &config.source.url)?;
            log::info!("✓ Config OK (source, selectors, schedule)");

            if config.messenger.recipient_id.is_empty() || config.messenger.access_token.is_empty() {
                log::warn!("Messenger recipient or access token not set; notifications will fail");
            }
        }

        Command::Info => {
            let storage = LocalStorage::new(&config.storage.dir);
            let snapshot = storage.read_all().await?;

            log::info!("Storage directory: {}", storage.root_dir().display());
            match snapshot.updated_at {
                Some(updated) => log::info!("Last updated: {}", updated),
                None => log::info!("No snapshot found yet."),
            }
            log::info!("Stored slots: {}", snapshot.len());
            for entry in snapshot.entries.values() {
                log::info!("    {} | {} | {}", entry.date, entry.time_range, entry.instructor);
            }
        }
    }

    Ok(())
}
