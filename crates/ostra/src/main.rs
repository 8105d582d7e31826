// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binary entry point for the Ostra conversation agent.

mod serve;

use clap::{Parser, Subcommand};

use ostra_config::OstraConfig;
use ostra_core::OstraError;
use ostra_storage::{Database, queries::queue};

/// Ostra - omni-channel commerce conversation agent.
#[derive(Parser, Debug)]
#[command(name = "ostra", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the worker pool against the ingestion queue.
    Serve,
    /// Print the effective configuration.
    Config,
    /// List dead-lettered messages on the ingestion stream.
    DeadLetters {
        /// Maximum number of entries to show.
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

fn load_config() -> Result<OstraConfig, OstraError> {
    ostra_config::load_config().map_err(|e| OstraError::Config(e.to_string()))
}

fn init_tracing(config: &OstraConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.agent.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn show_config(config: &OstraConfig) -> Result<(), OstraError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| OstraError::Internal(format!("config serialization: {e}")))?;
    println!("{rendered}");
    Ok(())
}

async fn show_dead_letters(config: &OstraConfig, limit: i64) -> Result<(), OstraError> {
    let db = Database::open(&config.storage.database_path).await?;
    let dead = queue::list_dead_letters(&db, &config.queue.stream, limit).await?;
    if dead.is_empty() {
        println!("no dead letters on stream {}", config.queue.stream);
    }
    for letter in dead {
        println!(
            "{}  {}  failed_at={}  error={}",
            letter.id, letter.message_id, letter.failed_at, letter.error
        );
    }
    db.close().await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ostra: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => {
            init_tracing(&config);
            serve::run(config).await
        }
        Commands::Config => show_config(&config).await,
        Commands::DeadLetters { limit } => show_dead_letters(&config, limit).await,
    };

    if let Err(e) = result {
        eprintln!("ostra: {e}");
        std::process::exit(1);
    }
}
