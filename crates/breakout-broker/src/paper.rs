//! Paper trading adapter.

use async_trait::async_trait;
use breakout_core::{ExchangeAdapter, ExchangeError, Fill, OrderRequest, OrderSide, Quote};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::{Mutex, PoisonError};
use tracing::info;
use uuid::Uuid;

/// Reads prices from an inner adapter and fills market orders locally.
///
/// No order ever reaches the inner adapter.
pub struct PaperAdapter<A> {
    prices: A,
    slippage_pct: Decimal,
    fills: Mutex<Vec<Fill>>,
}

impl<A: ExchangeAdapter> PaperAdapter<A> {
    pub fn new(prices: A) -> Self {
        Self {
            prices,
            slippage_pct: Decimal::ZERO,
            fills: Mutex::new(Vec::new()),
        }
    }

    /// Fill buys above and sells below the last price by this percentage.
    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    /// Every simulated fill so far.
    pub fn fills(&self) -> Vec<Fill> {
        self.fills
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn fill_price(&self, last: Decimal, side: OrderSide) -> Decimal {
        let slip = self.slippage_pct / Decimal::ONE_HUNDRED;
        match side {
            OrderSide::Buy => last * (Decimal::ONE + slip),
            OrderSide::Sell => last * (Decimal::ONE - slip),
        }
    }
}

#[async_trait]
impl<A: ExchangeAdapter> ExchangeAdapter for PaperAdapter<A> {
    async fn fetch_price(&self, symbol: &str) -> Result<Quote, ExchangeError> {
        self.prices.fetch_price(symbol).await
    }

    async fn submit_market_order(&self, request: OrderRequest) -> Result<Fill, ExchangeError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ExchangeError::OrderRejected(format!(
                "quantity must be positive, got {}",
                request.quantity
            )));
        }
        let quote = self.prices.fetch_price(&request.symbol).await?;
        let fill = Fill {
            order_id: format!("paper-{}", Uuid::new_v4().simple()),
            symbol: request.symbol,
            side: request.side,
            quantity: request.quantity,
            price: self.fill_price(quote.last, request.side),
            timestamp: Utc::now(),
        };

        info!(
            "[paper] {} {} {} @ {}",
            fill.side, fill.quantity, fill.symbol, fill.price
        );
        self.fills
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fill.clone());
        Ok(fill)
    }

    fn name(&self) -> &str {
        "paper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct Fixed(Decimal);

    #[async_trait]
    impl ExchangeAdapter for Fixed {
        async fn fetch_price(&self, symbol: &str) -> Result<Quote, ExchangeError> {
            Ok(Quote::last_only(symbol, self.0, Utc::now()))
        }

        async fn submit_market_order(&self, _request: OrderRequest) -> Result<Fill, ExchangeError> {
            Err(ExchangeError::OrderRejected("inner adapter must not trade".into()))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_fills_at_last_price() {
        let paper = PaperAdapter::new(Fixed(dec!(100)));
        let fill = paper
            .submit_market_order(OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(0.5)))
            .await
            .unwrap();
        assert_eq!(fill.price, dec!(100));
        assert_eq!(fill.quantity, dec!(0.5));
        assert!(fill.order_id.starts_with("paper-"));
        assert_eq!(paper.fills().len(), 1);
    }

    #[tokio::test]
    async fn test_slippage_goes_against_trader() {
        let paper = PaperAdapter::new(Fixed(dec!(200))).with_slippage(dec!(0.5));
        let buy = paper
            .submit_market_order(OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(1)))
            .await
            .unwrap();
        let sell = paper
            .submit_market_order(OrderRequest::market("BTCUSDT", OrderSide::Sell, dec!(1)))
            .await
            .unwrap();
        assert_eq!(buy.price, dec!(201));
        assert_eq!(sell.price, dec!(199));
    }

    #[tokio::test]
    async fn test_rejects_zero_quantity() {
        let paper = PaperAdapter::new(Fixed(dec!(10)));
        let result = paper
            .submit_market_order(OrderRequest::market("BTCUSDT", OrderSide::Sell, Decimal::ZERO))
            .await;
        assert!(matches!(result, Err(ExchangeError::OrderRejected(_))));
        assert!(paper.fills().is_empty());
        assert_eq!(paper.fetch_price("X").await.unwrap().last, dec!(10));
    }

    #[tokio::test]
    async fn test_fill_recorded_after_poisoned_lock() {
        let paper = PaperAdapter::new(Fixed(dec!(100)));
        std::thread::scope(|s| {
            let holder = s.spawn(|| {
                let _guard = paper.fills.lock().unwrap();
                panic!("panic while holding the fill log");
            });
            assert!(holder.join().is_err());
        });
        assert!(paper.fills.is_poisoned());

        paper
            .submit_market_order(OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(1)))
            .await
            .unwrap();
        assert_eq!(paper.fills().len(), 1);
    }
}
