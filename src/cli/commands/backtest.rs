//! Backtest command implementation.

use anyhow::{Context, Result};
use breakout_backtest::{BacktestConfig, Backtester};
use breakout_config::AppConfig;
use breakout_data::{load_csv, BarFormat, LoadOptions};
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

use crate::cli::{BacktestArgs, OutputFormat};

pub fn run(args: BacktestArgs, config: &AppConfig) -> Result<()> {
    let strategy = config
        .strategy
        .to_strategy_config()
        .context("Invalid [strategy] configuration")?;

    let format: BarFormat = args
        .format
        .as_deref()
        .unwrap_or(&config.backtest.data_format)
        .parse()
        .context("Unknown data format")?;
    let options = LoadOptions::new(format)
        .with_shift_minutes(args.shift_minutes.unwrap_or(config.backtest.shift_minutes))
        .with_range(args.from, args.to);

    let bars = load_csv(&args.data, &options)
        .with_context(|| format!("Failed to load bars from {}", args.data.display()))?;
    info!("Loaded {} bars from {}", bars.len(), args.data.display());

    let backtest_config = BacktestConfig {
        starting_equity: config.backtest.starting_equity,
        symbol: config.backtest.symbol.clone(),
    };
    let report = Backtester::new(strategy, backtest_config)
        .run(&bars)
        .context("Backtest aborted")?;

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(path) = &args.save_trades {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        report.write_trades_csv(BufWriter::new(file))?;
        info!("Trades saved to {}", path.display());
    }

    Ok(())
}
