//! Stockroom CLI - command-line client for the master-data backend.
//!
//! ```bash
//! stockroom sign-in web-client --secret "$SECRET"
//! stockroom list uoms --dimension 2
//! stockroom prefs --theme dark
//! ```
//!
//! See `stockroom --help` for all available commands and options.

mod commands;

use clap::Parser;
use commands::Command;
use std::path::PathBuf;
use stockroom_core::config::{StockroomConfig, CONFIG_FILE};
use stockroom_core::logging::{init_logging, LogTarget};
use stockroom_core::App;

#[derive(Parser)]
#[command(
    name = "stockroom",
    about = "Inventory and master-data client",
    version,
    after_help = "Settings are read from stockroom.toml and STOCKROOM_* environment variables."
)]
struct Cli {
    /// Configuration file
    #[arg(long, short, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Override the backend base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = StockroomConfig::load_from(&cli.config)?;
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }

    // stdout carries the JSON output
    init_logging(&App::logging_config(&config, cli.verbose).with_target(LogTarget::Stderr))?;

    log::debug!("Using backend {}", config.client.base_url);

    let app = App::from_config(&config).await?;
    let output = commands::run(&app, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
