//! Paper trading command implementation.

use anyhow::Result;
use breakout_broker::{BinanceAdapter, PaperAdapter};
use breakout_config::AppConfig;

use crate::cli::PaperArgs;

pub async fn run(args: PaperArgs, config: &AppConfig) -> Result<()> {
    let prices = BinanceAdapter::public(&config.live.base_url)?;
    let adapter = PaperAdapter::new(prices).with_slippage(config.live.paper_slippage_pct);
    super::live::trade(adapter, args.symbol, config).await
}
