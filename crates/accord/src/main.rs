// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accord - per-user account data store.
//!
//! Binary entry point: loads configuration, opens the SQLite store, and runs
//! one administrative command against it.

mod account_data;
mod check;

use std::path::PathBuf;

use accord_config::AccordConfig;
use accord_core::{AccordError, Localpart, StorageAdapter};
use accord_storage::SqliteAccountStore;
use clap::{Parser, Subcommand};
use tracing::debug;

/// Accord - per-user account data store.
#[derive(Parser, Debug)]
#[command(name = "accord", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the rooms a user has account data in.
    AccountData {
        /// Localpart of the user.
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Print the account data stored for one type.
    Get {
        #[arg(long, default_value = "")]
        name: String,
        /// Account data type, e.g. `m.push_rules`.
        #[arg(long = "type")]
        data_type: String,
        /// Room id; omit for global account data.
        #[arg(long)]
        room: Option<String>,
    },
    /// Store account data for one type.
    Set {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long = "type")]
        data_type: String,
        #[arg(long)]
        room: Option<String>,
        /// JSON content.
        content: String,
    },
    /// Open the store and run its health check.
    Check,
}

impl Commands {
    fn name(&self) -> Option<&str> {
        match self {
            Commands::AccountData { name }
            | Commands::Get { name, .. }
            | Commands::Set { name, .. } => Some(name),
            Commands::Check => None,
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Commands::AccountData { .. } => "list account data rooms",
            Commands::Get { .. } => "get account data",
            Commands::Set { .. } => "set account data",
            Commands::Check => "check storage",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => accord_config::load_and_validate_path(path),
        None => accord_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            accord_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    let localpart = match cli.command.name() {
        Some(name) if name.trim().is_empty() => {
            println!("Name must not be empty.");
            return;
        }
        Some(name) => match Localpart::new(name) {
            Ok(localpart) => Some(localpart),
            Err(e) => {
                eprintln!("Failed to {}: {e}", cli.command.action());
                std::process::exit(1);
            }
        },
        None => None,
    };

    if let Err(e) = run(&config, cli.command, localpart).await {
        eprintln!("Failed to {e}");
        std::process::exit(1);
    }
}

async fn run(
    config: &AccordConfig,
    command: Commands,
    localpart: Option<Localpart>,
) -> Result<(), String> {
    let action = command.action();
    let fail = |e: AccordError| format!("{action}: {e}");

    debug!(command = action, path = %config.storage.database_path, "running command");
    let store = SqliteAccountStore::open(config.storage.clone())
        .await
        .map_err(|e| format!("open storage: {e}"))?;
    let mut stdout = std::io::stdout().lock();

    let result = match (command, localpart) {
        (Commands::AccountData { .. }, Some(localpart)) => {
            account_data::run_account_data(&store, &localpart, &mut stdout).await
        }
        (Commands::Get { data_type, room, .. }, Some(localpart)) => {
            account_data::run_get(&store, &localpart, room.as_deref(), &data_type, &mut stdout)
                .await
        }
        (
            Commands::Set {
                data_type,
                room,
                content,
                ..
            },
            Some(localpart),
        ) => {
            account_data::run_set(
                &store,
                &localpart,
                room.as_deref(),
                &data_type,
                &content,
                &mut stdout,
            )
            .await
        }
        (Commands::Check, _) => check::run_check(&store, &mut stdout).await,
        (_, None) => Err(AccordError::Internal("missing user name".to_string())),
    };
    result.map_err(fail)?;

    store.close().await.map_err(|e| format!("close storage: {e}"))
}

/// Install the fmt subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("accord={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
