//! `coinmine` operator binary.
//!
//! Wires configuration, logging, the `PostgreSQL` store and the economy
//! engine together, then runs one command and exits.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `coinmine.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing) on stderr
//! 3. Connect to `PostgreSQL`
//! 4. Run the command; player commands print a JSON response on stdout

mod commands;
mod error;

use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use coinmine_db::{PgLedgerStore, PostgresConfig, PostgresPool};
use coinmine_economy::{Economy, EconomyConfig, SystemClock};
use coinmine_economy::config::LoggingConfig;

use crate::commands::PlayerCommand;
use crate::error::CliError;

/// Coinmine economy operator CLI.
#[derive(Debug, Parser)]
#[command(name = "coinmine")]
#[command(about = "Coinmine economy engine: migrations, seeding and player operations", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "COINMINE_CONFIG", default_value = "coinmine.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,

    /// Upsert the level table and shop catalog from the configuration
    Seed,

    /// Player operations and reads
    #[command(flatten)]
    Player(PlayerCommand),
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the database or the command fails.
#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let config = load_config(Path::new(&cli.config))?;
    init_logging(&config.logging);

    let pool =
        PostgresPool::connect(&PostgresConfig::from_infrastructure(&config.infrastructure)).await?;
    let store = PgLedgerStore::new(pool.pool().clone());

    let result = match cli.command {
        Command::Migrate => pool.run_migrations().await.map_err(CliError::from),
        Command::Seed => {
            let items: Vec<_> = config.shop.iter().map(|seed| seed.to_item()).collect();
            store
                .seed(&config.level_definitions(), &items)
                .await
                .map(|_| ())
                .map_err(CliError::from)
        }
        Command::Player(command) => {
            let economy = Economy::new(store, Arc::new(SystemClock), config)?;
            commands::execute(command, &economy)
                .await
                .map(|output| println!("{output}"))
        }
    };

    pool.close().await;
    result
}

/// Load `coinmine.yaml`, falling back to defaults when it does not exist.
fn load_config(path: &Path) -> Result<EconomyConfig, CliError> {
    if path.exists() {
        Ok(EconomyConfig::from_file(path)?)
    } else {
        let mut config = EconomyConfig::default();
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

/// Initialize the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    info!(json = logging.json, "Logging initialized");
}
