//! CLI command implementations.

pub mod backtest;
pub mod live;
pub mod paper;
pub mod validate;
