//! Order types used by exchange adapters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Market order request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Client-assigned id, sent as `newClientOrderId` where supported
    pub client_order_id: String,
}

impl OrderRequest {
    /// Create a market order request with a fresh client id.
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            client_order_id: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Override the client order id.
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = id.into();
        self
    }
}

/// Executed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_request() {
        let a = OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(0.01));
        let b = OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(0.01));
        assert_ne!(a.client_order_id, b.client_order_id);
        assert_eq!(a.client_order_id.len(), 32);

        let c = a.with_client_order_id("entry-2024-01-02");
        assert_eq!(c.client_order_id, "entry-2024-01-02");
        assert_eq!(c.side.opposite(), OrderSide::Sell);
    }
}
