// Motorgate - Main Entry Point
//
// Serves the motor request API:
// - Daily motor-on quota
// - Operator shutdown override
// - Sequential on/off execution on the device control topic

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use motorgate::config::Config;
use motorgate::{http, logging};

/// Motorgate: quota-gated motor request queue
#[derive(Parser, Debug)]
#[command(name = "motorgate")]
#[command(author = "Motorgate Contributors")]
#[command(version)]
#[command(about = "Quota-gated, operator-overridable motor request queue", long_about = None)]
struct Args {
    /// Configuration file (default: $MOTORGATE_CONFIG or ~/.config/motorgate/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API and queue processor (default)
    Serve {
        /// Override the listen address
        #[arg(long)]
        bind: Option<String>,
    },
    /// Load and validate the configuration, then print it
    CheckConfig,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::CheckConfig => {
            let config = load_config(args.config.as_ref())?;
            let rendered = toml::to_string_pretty(&config.redacted())
                .context("Failed to render configuration")?;
            println!("Configuration OK\n\n{}", rendered);
        }
        Commands::Serve { bind } => {
            let mut config = load_config(args.config.as_ref())?;
            if let Some(bind) = bind {
                config.server.bind_addr = bind;
                config.validate()?;
            }

            logging::init(&config.logging, args.verbose)?;
            info!("Motorgate v{} starting...", env!("CARGO_PKG_VERSION"));

            http::run(config).await?;
        }
    }

    Ok(())
}
