//! Polling loop that drives the strategy engine from live quotes.

use breakout_core::{BreakoutResult, ExchangeAdapter, ExitReason, OrderRequest, OrderSide, Trade};
use breakout_monitor::render_status;
use breakout_strategy::{StrategyConfig, StrategyEngine, TradeLedger};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::backoff::Backoff;
use crate::quote_bar::bar_from_quote;

/// Live driver settings.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub symbol: String,
    /// Order size in base units
    pub quantity: Decimal,
    pub poll_interval: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Reference zone of the session windows
    pub timezone: Tz,
    /// Seed of the ledger's equity curve
    pub starting_equity: Decimal,
}

/// What a single poll did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Quote was not newer than the last processed bar.
    Skipped,
    /// Bar fed to the engine.
    Processed {
        entered: bool,
        closed: Option<Trade>,
    },
}

/// Live trader: engine, ledger and exchange adapter.
pub struct LiveTrader<A> {
    adapter: A,
    engine: StrategyEngine,
    ledger: TradeLedger,
    config: LiveConfig,
    backoff: Backoff,
}

impl<A: ExchangeAdapter> LiveTrader<A> {
    pub fn new(adapter: A, strategy: StrategyConfig, config: LiveConfig) -> BreakoutResult<Self> {
        let engine = StrategyEngine::new(strategy)?;
        Ok(Self {
            adapter,
            engine,
            ledger: TradeLedger::new(config.starting_equity),
            backoff: Backoff::new(config.initial_backoff, config.max_backoff),
            config,
        })
    }

    pub fn engine(&self) -> &StrategyEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Status block for the operator.
    pub fn status(&self) -> String {
        render_status(
            &self.config.symbol,
            &self.engine.snapshot(),
            &self.ledger.stats(),
        )
    }

    /// Poll once.
    ///
    /// A failed fetch returns the exchange error and leaves the engine
    /// untouched. Order failures after a transition are logged only; the
    /// engine stays the source of truth.
    pub async fn tick(&mut self) -> BreakoutResult<TickOutcome> {
        let quote = self.adapter.fetch_price(&self.config.symbol).await?;
        let bar = bar_from_quote(&quote, self.config.timezone);

        if let Some(last) = self.engine.last_bar() {
            if bar.timestamp <= last.timestamp {
                debug!(timestamp = %bar.timestamp, "stale quote, skipping");
                return Ok(TickOutcome::Skipped);
            }
        }

        let was_open = self.engine.open_position().is_some();
        let closed = self.engine.advance(&bar)?;

        if let Some(trade) = &closed {
            info!(
                side = %trade.side(),
                reason = %trade.exit_reason,
                exit = %trade.exit_price,
                pnl_pct = %trade.pnl_pct.round_dp(4),
                "position closed"
            );
            self.submit(trade.side().exit_order_side(), "exit").await;
            self.ledger.append(trade.clone());
        }

        let entered = match self.engine.open_position() {
            Some(position) if !was_open || closed.is_some() => {
                let side = position.side.entry_order_side();
                self.submit(side, "entry").await;
                true
            }
            _ => false,
        };

        Ok(TickOutcome::Processed { entered, closed })
    }

    async fn submit(&self, side: OrderSide, purpose: &str) {
        let request = OrderRequest::market(&self.config.symbol, side, self.config.quantity);
        match self.adapter.submit_market_order(request).await {
            Ok(fill) => info!(
                purpose,
                order_id = %fill.order_id,
                price = %fill.price,
                "{} {} {} filled",
                fill.side,
                fill.quantity,
                fill.symbol
            ),
            Err(e) => error!(purpose, %side, error = %e, "order submission failed"),
        }
    }

    /// Poll until `shutdown` resolves.
    ///
    /// Transient fetch errors back off and retry; any other error ends the
    /// loop.
    pub async fn run_until<F>(&mut self, shutdown: F) -> BreakoutResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            symbol = %self.config.symbol,
            adapter = self.adapter.name(),
            interval_secs = self.config.poll_interval.as_secs(),
            "live trader started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {}
            }

            match self.tick().await {
                Ok(TickOutcome::Processed { entered, closed }) => {
                    self.backoff.reset();
                    if entered || closed.is_some() {
                        info!("\n{}", self.status());
                    }
                }
                Ok(TickOutcome::Skipped) => self.backoff.reset(),
                Err(e) if e.is_transient() => {
                    let delay = self.backoff.next_delay();
                    warn!(error = %e, retry_in_ms = delay.as_millis() as u64, "price fetch failed, retrying");
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }

        info!("shutdown requested");
        if let Some(position) = self.engine.open_position() {
            warn!(
                side = %position.side,
                entry = %position.entry_price,
                "position still open at shutdown"
            );
        }
        info!("\n{}", self.status());
        Ok(())
    }

    /// Poll until Ctrl-C.
    pub async fn run(&mut self) -> BreakoutResult<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl-C");
            }
        })
        .await
    }

    /// Close any open position at the last price and send the exit order.
    pub async fn flatten(&mut self) -> Option<Trade> {
        let trade = self.engine.close_open_position(ExitReason::TimeExit)?;
        self.submit(trade.side().exit_order_side(), "exit").await;
        self.ledger.append(trade.clone());
        Some(trade)
    }
}
