//! Live trading command implementation.

use anyhow::{Context, Result};
use breakout_broker::{BinanceAdapter, BinanceConfig, PaperAdapter};
use breakout_config::AppConfig;
use breakout_core::ExchangeAdapter;
use breakout_live::{parse_timezone, LiveConfig, LiveTrader};
use std::time::Duration;
use tracing::info;

use crate::cli::LiveArgs;

pub async fn run(args: LiveArgs, config: &AppConfig) -> Result<()> {
    if args.dry_run {
        info!("Dry run: orders are filled locally");
        let prices = BinanceAdapter::public(&config.live.base_url)?;
        let adapter = PaperAdapter::new(prices).with_slippage(config.live.paper_slippage_pct);
        return trade(adapter, args.symbol, config).await;
    }

    let live = &config.live;
    let binance = BinanceConfig::from_env(&live.api_key_env, &live.api_secret_env, &live.base_url)
        .context("Live trading needs exchange credentials")?;
    trade(BinanceAdapter::new(binance)?, args.symbol, config).await
}

/// Build a trader around `adapter` and poll until Ctrl-C.
pub(crate) async fn trade<A: ExchangeAdapter>(
    adapter: A,
    symbol: Option<String>,
    config: &AppConfig,
) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    let strategy = config.strategy.to_strategy_config()?;
    let live = &config.live;

    let live_config = LiveConfig {
        symbol: symbol.unwrap_or_else(|| live.symbol.clone()),
        quantity: live.quantity,
        poll_interval: Duration::from_secs(live.poll_interval_secs),
        initial_backoff: Duration::from_secs(live.initial_backoff_secs),
        max_backoff: Duration::from_secs(live.max_backoff_secs),
        timezone: parse_timezone(&live.timezone)?,
        starting_equity: config.backtest.starting_equity,
    };

    info!(
        "Trading {} via {} (Ctrl-C to stop)",
        live_config.symbol,
        adapter.name()
    );
    let mut trader = LiveTrader::new(adapter, strategy, live_config)?;
    trader.run().await?;
    Ok(())
}
