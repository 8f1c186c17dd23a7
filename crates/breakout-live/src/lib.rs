//! Live driver.
//!
//! Polls an exchange adapter for the latest price, turns each quote into a
//! bar in the reference time zone and feeds it to the strategy engine.

mod backoff;
mod quote_bar;
mod trader;

pub use backoff::Backoff;
pub use quote_bar::{bar_from_quote, parse_timezone};
pub use trader::{LiveConfig, LiveTrader, TickOutcome};
