//! Exchange adapters.
//!
//! [`BinanceAdapter`] talks to the Binance spot REST API.
//! [`PaperAdapter`] wraps any adapter, reads its prices and fills orders
//! locally.

mod binance;
mod paper;
mod sign;

pub use binance::{BinanceAdapter, BinanceConfig};
pub use paper::PaperAdapter;
pub use sign::sign_request;
