//! Session breakout CLI application.

mod cli;

use anyhow::{Context, Result};
use breakout_config::load_config;
use breakout_monitor::setup_logging;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json = cli.json_logs || config.logging.format.eq_ignore_ascii_case("json");
    let _guard = setup_logging(&level, json, config.logging.file.as_deref().map(Path::new));

    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, &config),
        Commands::Live(args) => cli::commands::live::run(args, &config).await,
        Commands::Paper(args) => cli::commands::paper::run(args, &config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config, &config),
    }
}
