mod fetch;
mod pipeline;
mod proxies;
mod report;
mod session;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "infscope")]
#[command(about = "Influencer metrics collector: reads handles from a sheet, writes a metrics report")]
struct Cli {
    /// Defaults to `run` when omitted.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Read the input sheet, collect every handle, write the report sheet
    Run,
    /// Fetch one Instagram profile through the browser and print it as JSON
    Instagram {
        /// Profile handle, with or without a leading `@`
        handle: String,
    },
    /// Fetch one YouTube channel and print it as JSON
    Youtube {
        /// Channel handle or search term
        handle: String,
    },
    /// Load the configured proxy pool and list it
    Proxies {
        /// Probe each proxy against the configured probe URL
        #[arg(long)]
        probe: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = infscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => pipeline::run(&config).await,
        Commands::Instagram { handle } => fetch::run_instagram(&config, &handle).await,
        Commands::Youtube { handle } => fetch::run_youtube(&config, &handle).await,
        Commands::Proxies { probe } => proxies::run_proxies(&config, probe).await,
    }
}
