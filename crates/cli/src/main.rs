//! DialogBridge CLI: the main entry point.
//!
//! Commands:
//! - `onboard` : Write a default config file
//! - `gateway` : Start the fulfillment webhook server
//! - `simulate`: Run one webhook request through the assistant
//! - `status`  : Show the effective configuration
//! - `doctor`  : Diagnose configuration and provider reachability

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "dialogbridge",
    about = "DialogBridge — LLM fulfillment webhook for conversational platforms",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "DIALOGBRIDGE_JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write ~/.dialogbridge/config.toml with defaults
    Onboard,

    /// Start the HTTP webhook server
    Gateway {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send one webhook request (JSON file, or `-` for stdin) through the assistant
    Simulate {
        /// Path to the request body
        file: PathBuf,
    },

    /// Show the effective configuration
    Status,

    /// Diagnose configuration and provider reachability
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Gateway { host, port } => commands::gateway::run(host, port).await?,
        Commands::Simulate { file } => commands::simulate::run(file).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
