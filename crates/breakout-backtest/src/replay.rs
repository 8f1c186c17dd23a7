//! Historical replay driver.

use std::collections::BTreeSet;

use breakout_core::{Bar, EngineError, ExitReason};
use breakout_strategy::{StrategyConfig, StrategyEngine, TradeLedger};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::report::BacktestReport;

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Seed of the compounded equity curve
    pub starting_equity: Decimal,
    /// Label for reports
    pub symbol: String,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            starting_equity: dec!(100),
            symbol: String::new(),
        }
    }
}

/// Replays an ordered bar sequence through a fresh engine.
pub struct Backtester {
    strategy: StrategyConfig,
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(strategy: StrategyConfig, config: BacktestConfig) -> Self {
        Self { strategy, config }
    }

    /// Run the replay.
    ///
    /// Bars are consumed lazily. A position still open after the last bar is
    /// closed at that bar's close with `time_exit`. Contract violations in
    /// the input stop the run and are returned.
    pub fn run<'a, I>(&self, bars: I) -> Result<BacktestReport, EngineError>
    where
        I: IntoIterator<Item = &'a Bar>,
    {
        let mut engine = StrategyEngine::new(self.strategy.clone())?;
        let mut ledger = TradeLedger::new(self.config.starting_equity);
        let mut trading_days = BTreeSet::new();
        let mut first_bar = None;

        for bar in bars {
            first_bar.get_or_insert(bar.timestamp);
            if let Some(trade) = engine.advance(bar)? {
                trading_days.insert(trade.date);
                ledger.append(trade);
            }
        }

        if let Some(trade) = engine.close_open_position(ExitReason::TimeExit) {
            trading_days.insert(trade.date);
            ledger.append(trade);
        }

        if engine.bars_processed() == 0 {
            warn!("no bars to replay");
        }

        let last_bar = engine.last_bar().map(|b| b.timestamp);
        info!(
            bars = engine.bars_processed(),
            days = engine.days_seen(),
            trades = ledger.len(),
            net_pnl_pct = %ledger.net_pnl_pct().round_dp(4),
            "backtest complete"
        );

        Ok(BacktestReport {
            config: self.config.clone(),
            strategy: self.strategy.clone(),
            stats: ledger.stats(),
            equity_curve: ledger.equity_curve(),
            drawdown_abs: ledger.drawdown_abs(),
            trades: ledger.trades().to_vec(),
            bars_processed: engine.bars_processed(),
            days_seen: engine.days_seen(),
            trading_days: trading_days.len(),
            first_bar,
            last_bar,
        })
    }
}
