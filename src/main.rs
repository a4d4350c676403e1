//! Maestro CLI entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use maestro::adapters::openai::{OpenAiClient, OpenAiClientConfig};
use maestro::adapters::sqlite::{all_embedded_migrations, create_pool, verify_connection, Migrator};
use maestro::application::CoordinatorAction;
use maestro::infrastructure::{logging, ConfigLoader};
use maestro::services::RetryPolicy;

#[derive(Parser)]
#[command(name = "maestro", about = "Adaptive task orchestration engine", version)]
struct Cli {
    /// Path to a config file (defaults to maestro.yaml + MAESTRO_* env)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply embedded migrations to the configured database
    InitDb,
    /// Dispatch one coordinator action with a JSON payload
    Dispatch {
        /// Action name, e.g. analyze_and_generate_tasks
        action: String,
        /// JSON payload; must carry user_id
        payload: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        // Errors reach the caller as structured JSON on stdout
        println!("{}", json!({ "error": err.to_string() }));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    logging::init(&config.logging)?;

    let pool = create_pool(&config.database)
        .await
        .context("Failed to open database")?;
    verify_connection(&pool)
        .await
        .context("Database is not reachable")?;

    match cli.command {
        Commands::InitDb => {
            let applied = Migrator::new(pool)
                .run_embedded_migrations(all_embedded_migrations())
                .await?;
            println!("{}", json!({ "migrations_applied": applied }));
            Ok(())
        }
        Commands::Dispatch { action, payload } => {
            let Some(action) = CoordinatorAction::from_str(&action) else {
                bail!("Unknown action: {action}");
            };
            let payload: serde_json::Value =
                serde_json::from_str(&payload).context("Payload is not valid JSON")?;

            let client = Arc::new(OpenAiClient::new(OpenAiClientConfig {
                api_key: config.completion.api_key.clone(),
                base_url: config.completion.base_url.clone(),
                model: config.completion.model.clone(),
                timeout_secs: config.completion.timeout_secs,
            })?);

            let coordinator = maestro::build_coordinator(
                pool,
                client,
                RetryPolicy::new(
                    config.retry.max_retries,
                    config.retry.initial_backoff_ms,
                    config.retry.max_backoff_ms,
                ),
                Duration::from_secs(config.completion.timeout_secs),
                config.completion.max_tokens,
            );

            let response = coordinator.dispatch(action, payload).await?;
            println!("{response}");
            Ok(())
        }
    }
}
