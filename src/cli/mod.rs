//! CLI definitions.

pub mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "breakout")]
#[command(author, version, about = "Intraday session-range breakout trader")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level, overrides the config file
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay historical bars from a CSV file
    Backtest(BacktestArgs),
    /// Trade live against the exchange
    Live(LiveArgs),
    /// Trade live prices with simulated fills
    Paper(PaperArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// Data file (CSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Data layout (generic, mt5); defaults to the config value
    #[arg(short, long)]
    pub format: Option<String>,

    /// Minutes added to every timestamp; defaults to the config value
    #[arg(long, allow_hyphen_values = true)]
    pub shift_minutes: Option<i64>,

    /// First date to replay (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last date to replay (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Write the trade list to this CSV file
    #[arg(long)]
    pub save_trades: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct LiveArgs {
    /// Symbol to trade; defaults to the config value
    #[arg(short = 'S', long)]
    pub symbol: Option<String>,

    /// Simulate fills instead of sending orders
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args)]
pub struct PaperArgs {
    /// Symbol to trade; defaults to the config value
    #[arg(short = 'S', long)]
    pub symbol: Option<String>,
}
