use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pagepilot::cli::{
    cmd_elements, cmd_extract, cmd_login_check, cmd_resolve, cmd_run, Commands, OutputFormat,
};
use pagepilot::Config;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// PagePilot - perceive, act on and extract from web pages
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug, cli.log_json)?;
    info!("Starting PagePilot v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(cli.config.as_deref()).await?;

    let result = match cli.command {
        Commands::Extract { source, data_type } => {
            cmd_extract(source, data_type, &config, cli.output).await
        }
        Commands::Elements { source } => cmd_elements(source, &config, cli.output).await,
        Commands::Resolve {
            source,
            description,
        } => cmd_resolve(source, description, &config, cli.output).await,
        Commands::LoginCheck { source } => cmd_login_check(source, &config, cli.output).await,
        Commands::Run(args) => cmd_run(args, &config, cli.output).await,
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {err:#}");
            Err(err)
        }
    }
}

fn init_logging(level: &str, debug: bool, json: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
