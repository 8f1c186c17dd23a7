//! Exchange adapter trait definition.

use crate::error::ExchangeError;
use crate::types::{Fill, OrderRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest price snapshot for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol
    pub symbol: String,
    /// Last traded price
    pub last: Decimal,
    /// Best bid price, when the venue reports it
    pub bid: Option<Decimal>,
    /// Best ask price, when the venue reports it
    pub ask: Option<Decimal>,
    /// Time the quote was taken
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Quote carrying only a last price.
    pub fn last_only(symbol: impl Into<String>, last: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            last,
            bid: None,
            ask: None,
            timestamp,
        }
    }

    /// Bid/ask spread, if both sides are known.
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.ask? - self.bid?)
    }
}

/// Narrow exchange capability used by the live driver.
///
/// The strategy core never talks to an exchange; only the live driver holds
/// an adapter.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Fetch the latest price for a symbol.
    async fn fetch_price(&self, symbol: &str) -> Result<Quote, ExchangeError>;

    /// Submit a market order and wait for its fill.
    ///
    /// # Arguments
    /// * `request` - The order request to submit
    ///
    /// # Returns
    /// The fill reported by the venue
    async fn submit_market_order(&self, request: OrderRequest) -> Result<Fill, ExchangeError>;

    /// Get the adapter name.
    fn name(&self) -> &str;
}
