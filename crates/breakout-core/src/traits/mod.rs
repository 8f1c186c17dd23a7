//! Core traits for the breakout system.

mod exchange;

pub use exchange::{ExchangeAdapter, Quote};
