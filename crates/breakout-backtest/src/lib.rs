//! Historical replay driver and backtest reporting.

mod replay;
mod report;

pub use replay::{BacktestConfig, Backtester};
pub use report::BacktestReport;
