mod banner;
mod config_cmd;
mod console;
mod scan_cmd;
mod send_cmd;
mod source;
mod terminal_output;
mod watch_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use codeferry_config::{config_dir, config_file_path, load_and_prepare, FerryConfig};
use codeferry_logging::init_logger;

#[derive(Parser)]
#[command(name = "codeferry")]
#[command(about = "Capture code blocks from web pages and ferry them to a conversion service")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.codeferry/config.yaml)
    #[arg(long, global = true, env = "CODEFERRY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or EnvFilter directive; overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract code blocks from a page once and print them
    Scan {
        /// HTML file or http(s) URL
        source: String,
        /// Page URL a saved file came from (decides the platform)
        #[arg(long)]
        url: Option<String>,
        /// Print blocks as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Watch a page: deliver new blocks and take actions from stdin
    Watch {
        /// HTML file or http(s) URL
        source: String,
        /// Page URL a saved file came from (decides the platform)
        #[arg(long)]
        url: Option<String>,
        /// Route deliveries through the extension bridge
        #[arg(long)]
        bridge: bool,
    },
    /// Send text (or stdin) to the converter
    Send {
        text: Option<String>,
    },
    /// Print the effective configuration
    Config {
        /// Write the effective configuration back to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(|| config_file_path(&config_dir()));
    let config = load_and_prepare(&config_path).await?;
    init_logging(&config, cli.log_level.as_deref())?;
    debug!(path = %config_path.display(), "Configuration loaded");

    match cli.command {
        Commands::Scan { source, url, json } => scan_cmd::run(&config, &source, url, json).await,
        Commands::Watch { source, url, bridge } => watch_cmd::run(&config, &source, url, bridge).await,
        Commands::Send { text } => send_cmd::run(&config, text).await,
        Commands::Config { write } => config_cmd::run(&config, &config_path, write).await,
    }
}

fn init_logging(config: &FerryConfig, cli_level: Option<&str>) -> Result<()> {
    let level = cli_level
        .or(config.logging.level.as_deref())
        .unwrap_or(codeferry_config::defaults::DEFAULT_LOG_LEVEL);
    init_logger(config.logging.dir.as_deref(), level)
}
