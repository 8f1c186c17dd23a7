//! Binance spot REST adapter.

use async_trait::async_trait;
use breakout_core::{ExchangeAdapter, ExchangeError, Fill, OrderRequest, Quote};
use chrono::{TimeZone, Utc};
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::sign::sign_request;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Binance API configuration.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub base_url: String,
    /// Milliseconds a signed request stays valid on the server
    pub recv_window: u64,
}

impl BinanceConfig {
    /// Create config with credentials.
    pub fn new(api_key: String, api_secret: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key),
            api_secret: Some(api_secret),
            base_url: base_url.into(),
            recv_window: 5000,
        }
    }

    /// Price-only access; order submission will fail.
    pub fn public(base_url: impl Into<String>) -> Self {
        Self {
            api_key: None,
            api_secret: None,
            base_url: base_url.into(),
            recv_window: 5000,
        }
    }

    /// Read credentials from the named environment variables.
    pub fn from_env(
        key_env: &str,
        secret_env: &str,
        base_url: impl Into<String>,
    ) -> Result<Self, ExchangeError> {
        let api_key = std::env::var(key_env)
            .map_err(|_| ExchangeError::Configuration(format!("{key_env} not set")))?;
        let api_secret = std::env::var(secret_env)
            .map_err(|_| ExchangeError::Configuration(format!("{secret_env} not set")))?;
        Ok(Self::new(api_key, api_secret, base_url))
    }

    fn credentials(&self) -> Result<(&str, &str), ExchangeError> {
        match (&self.api_key, &self.api_secret) {
            (Some(k), Some(s)) => Ok((k, s)),
            _ => Err(ExchangeError::Configuration(
                "API credentials required for order submission".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    symbol: String,
    order_id: i64,
    #[serde(default)]
    transact_time: Option<i64>,
    executed_qty: Decimal,
    cummulative_quote_qty: Decimal,
    status: String,
    #[serde(default)]
    fills: Vec<OrderFill>,
}

#[derive(Debug, Deserialize)]
struct OrderFill {
    price: Decimal,
    qty: Decimal,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

impl OrderResponse {
    /// Volume-weighted fill price.
    fn average_price(&self) -> Option<Decimal> {
        let qty: Decimal = self.fills.iter().map(|f| f.qty).sum();
        if qty > Decimal::ZERO {
            let notional: Decimal = self.fills.iter().map(|f| f.price * f.qty).sum();
            return Some(notional / qty);
        }
        if self.executed_qty > Decimal::ZERO {
            return Some(self.cummulative_quote_qty / self.executed_qty);
        }
        None
    }
}

fn api_error(status: u16, body: &str) -> ExchangeError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => format!("{} (code {})", err.msg, err.code),
        Err(_) => body.to_string(),
    };
    ExchangeError::Api { status, message }
}

fn transport_error(e: reqwest::Error) -> ExchangeError {
    if e.is_decode() {
        ExchangeError::InvalidResponse(e.to_string())
    } else {
        ExchangeError::Connection(e.to_string())
    }
}

async fn check_status(resp: Response) -> Result<Response, ExchangeError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(api_error(status, &body))
}

/// Binance spot exchange adapter.
pub struct BinanceAdapter {
    config: BinanceConfig,
    client: Client,
}

impl BinanceAdapter {
    pub fn new(config: BinanceConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExchangeError::Connection(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Adapter without credentials, for price polling only.
    pub fn public(base_url: impl Into<String>) -> Result<Self, ExchangeError> {
        Self::new(BinanceConfig::public(base_url))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    async fn fetch_price(&self, symbol: &str) -> Result<Quote, ExchangeError> {
        let url = self.url("/api/v3/ticker/price");
        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(transport_error)?;
        let ticker: TickerPrice = check_status(resp)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        if ticker.price <= Decimal::ZERO {
            return Err(ExchangeError::NoPrice(ticker.symbol));
        }
        debug!("{} last {}", ticker.symbol, ticker.price);
        Ok(Quote::last_only(ticker.symbol, ticker.price, Utc::now()))
    }

    async fn submit_market_order(&self, request: OrderRequest) -> Result<Fill, ExchangeError> {
        let (api_key, api_secret) = self.config.credentials()?;

        let query = format!(
            "symbol={}&side={}&type=MARKET&quantity={}&newClientOrderId={}&newOrderRespType=FULL&recvWindow={}&timestamp={}",
            request.symbol,
            request.side,
            request.quantity.normalize(),
            request.client_order_id,
            self.config.recv_window,
            Utc::now().timestamp_millis()
        );
        let signature = sign_request(api_secret, &query)?;
        let url = format!("{}?{}&signature={}", self.url("/api/v3/order"), query, signature);

        debug!("Submitting {} {} {}", request.side, request.quantity, request.symbol);
        let resp = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", api_key)
            .send()
            .await
            .map_err(transport_error)?;
        let order: OrderResponse = check_status(resp)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        if order.status != "FILLED" && order.status != "PARTIALLY_FILLED" {
            return Err(ExchangeError::OrderRejected(format!(
                "order {} status {}",
                order.order_id, order.status
            )));
        }
        let price = order.average_price().ok_or_else(|| {
            ExchangeError::InvalidResponse(format!("order {} has no executed quantity", order.order_id))
        })?;
        let timestamp = order
            .transact_time
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);

        info!(
            "Order {} filled: {} {} {} @ {}",
            order.order_id, request.side, order.executed_qty, order.symbol, price
        );
        Ok(Fill {
            order_id: order.order_id.to_string(),
            symbol: order.symbol,
            side: request.side,
            quantity: order.executed_qty,
            price,
            timestamp,
        })
    }

    fn name(&self) -> &str {
        "binance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breakout_core::OrderSide;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ticker_parses_string_price() {
        let t: TickerPrice =
            serde_json::from_str(r#"{"symbol":"BTCUSDT","price":"43125.51000000"}"#).unwrap();
        assert_eq!(t.symbol, "BTCUSDT");
        assert_eq!(t.price, dec!(43125.51));
    }

    #[test]
    fn test_average_price_from_fills() {
        let body = r#"{
            "symbol": "BTCUSDT", "orderId": 28, "clientOrderId": "abc",
            "transactTime": 1507725176595, "price": "0.00000000",
            "origQty": "0.002", "executedQty": "0.002",
            "cummulativeQuoteQty": "80.1", "status": "FILLED",
            "fills": [
                {"price": "40000", "qty": "0.001", "commission": "0", "commissionAsset": "BNB"},
                {"price": "40100", "qty": "0.001", "commission": "0", "commissionAsset": "BNB"}
            ]
        }"#;
        let order: OrderResponse = serde_json::from_str(body).unwrap();
        assert_eq!(order.average_price(), Some(dec!(40050)));
    }

    #[test]
    fn test_average_price_from_cumulative_quote() {
        let body = r#"{"symbol":"BTCUSDT","orderId":29,"executedQty":"0.5",
            "cummulativeQuoteQty":"100","status":"FILLED"}"#;
        let order: OrderResponse = serde_json::from_str(body).unwrap();
        assert!(order.fills.is_empty());
        assert_eq!(order.average_price(), Some(dec!(200)));
    }

    #[test]
    fn test_api_error_mapping() {
        let err = api_error(400, r#"{"code":-1013,"msg":"Filter failure: LOT_SIZE"}"#);
        match &err {
            ExchangeError::Api { status, message } => {
                assert_eq!(*status, 400);
                assert!(message.contains("LOT_SIZE"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!err.is_transient());
        assert!(api_error(503, "<html>").is_transient());
    }

    #[tokio::test]
    async fn test_public_adapter_cannot_trade() {
        let adapter = BinanceAdapter::public("https://api.binance.com").unwrap();
        let result = adapter
            .submit_market_order(OrderRequest::market("BTCUSDT", OrderSide::Buy, dec!(0.001)))
            .await;
        assert!(matches!(result, Err(ExchangeError::Configuration(_))));
        assert_eq!(adapter.name(), "binance");
    }
}
