//! Strategy engine: the single `advance(bar)` entry point shared by the
//! replay and live drivers.
//!
//! Per bar the engine validates input, applies the mid-price adjustment,
//! handles the day rollover, updates the session range, computes triggers
//! once the range is final, and hands the bar to the position machine.

use breakout_core::{
    Bar, EngineError, ExitReason, MidPriceAdjustment, Position, SessionRange, Trade, TriggerLevels,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StrategyConfig;
use crate::machine::PositionStateMachine;
use crate::session::SessionTracker;
use crate::trigger::TriggerCalculator;

/// Point-in-time view of the engine, for status output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub last_timestamp: Option<NaiveDateTime>,
    pub session: Option<SessionRange>,
    pub triggers: Option<TriggerLevels>,
    pub position: Option<Position>,
    pub traded_today: bool,
    pub bars_processed: u64,
    pub days_seen: u64,
}

/// Breakout strategy engine. One instance per run; no shared state.
#[derive(Debug, Clone)]
pub struct StrategyEngine {
    config: StrategyConfig,
    adjustment: MidPriceAdjustment,
    session: SessionTracker,
    calculator: TriggerCalculator,
    machine: PositionStateMachine,
    triggers: Option<TriggerLevels>,
    last_bar: Option<Bar>,
    bars_processed: u64,
    days_seen: u64,
}

impl StrategyEngine {
    /// Create an engine after validating the configuration.
    pub fn new(config: StrategyConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            adjustment: MidPriceAdjustment::new(config.point_multiplier),
            session: SessionTracker::new(config.session_start, config.session_end),
            calculator: TriggerCalculator::new(config.buffer_pct),
            machine: PositionStateMachine::new(config.clone()),
            triggers: None,
            last_bar: None,
            bars_processed: 0,
            days_seen: 0,
            config,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Process one bar. Returns the trade closed on this bar, if any.
    ///
    /// Bars must arrive with strictly increasing timestamps; a violation is
    /// an error and the engine state is left untouched.
    pub fn advance(&mut self, bar: &Bar) -> Result<Option<Trade>, EngineError> {
        bar.validate()?;
        if let Some(prev) = &self.last_bar {
            if bar.timestamp <= prev.timestamp {
                return Err(EngineError::OutOfOrder {
                    previous: prev.timestamp,
                    current: bar.timestamp,
                });
            }
        }

        let bar = self.adjustment.apply(bar);
        self.bars_processed += 1;

        let mut closed = None;
        let new_day = self.last_bar.map_or(true, |prev| prev.date() != bar.date());
        if new_day {
            if let Some(prev) = self.last_bar {
                closed = self
                    .machine
                    .force_close(prev.close, prev.timestamp, ExitReason::TimeExit);
            }
            self.triggers = None;
            self.machine.start_day(bar.date());
            self.days_seen += 1;
            info!(date = %bar.date(), "new trading day");
        }

        let event = self.session.observe(&bar);
        debug!(timestamp = %bar.timestamp, ?event, close = %bar.close, "bar");

        if self.triggers.is_none() && self.session.is_finalized() {
            if let Some(range) = self.session.range() {
                let levels = self.calculator.compute(range)?;
                info!(
                    buy = %levels.buy_trigger,
                    sell = %levels.sell_trigger,
                    "trigger levels set"
                );
                self.triggers = Some(levels);
            }
        }

        if self.machine.is_open() {
            if let Some(trade) = self.machine.manage(&bar) {
                closed = Some(trade);
            }
        } else if let Some(levels) = self.triggers {
            self.machine.try_enter(&bar, &levels);
        }

        self.last_bar = Some(bar);
        Ok(closed)
    }

    /// Close a still-open position at the last bar's close.
    pub fn close_open_position(&mut self, reason: ExitReason) -> Option<Trade> {
        let last = self.last_bar?;
        self.machine.force_close(last.close, last.timestamp, reason)
    }

    /// Snapshot of the open position.
    pub fn open_position(&self) -> Option<&Position> {
        self.machine.position()
    }

    /// Today's session range.
    pub fn session(&self) -> Option<&SessionRange> {
        self.session.range()
    }

    /// Today's trigger levels, once the range is final.
    pub fn triggers(&self) -> Option<&TriggerLevels> {
        self.triggers.as_ref()
    }

    /// Last (adjusted) bar processed.
    pub fn last_bar(&self) -> Option<&Bar> {
        self.last_bar.as_ref()
    }

    pub fn bars_processed(&self) -> u64 {
        self.bars_processed
    }

    pub fn days_seen(&self) -> u64 {
        self.days_seen
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            last_timestamp: self.last_bar.map(|b| b.timestamp),
            session: self.session.range().copied(),
            triggers: self.triggers,
            position: self.machine.position().copied(),
            traded_today: self.machine.traded_today(),
            bars_processed: self.bars_processed,
            days_seen: self.days_seen,
        }
    }

    /// Forget everything and start over with the same configuration.
    pub fn reset(&mut self) {
        self.session.reset();
        self.machine.reset();
        self.triggers = None;
        self.last_bar = None;
        self.bars_processed = 0;
        self.days_seen = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::costs::CostModel;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bar(ts: &str, high: Decimal, low: Decimal, close: Decimal) -> Bar {
        let ts = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap();
        Bar::new(ts, close, high, low, close)
    }

    /// Range 95..100 on 2024-01-02, finalized by the 09:20 bar.
    fn session_bars() -> Vec<Bar> {
        vec![
            bar("2024-01-02 08:15", dec!(98), dec!(96), dec!(97)),
            bar("2024-01-02 08:45", dec!(100), dec!(95), dec!(99)),
            bar("2024-01-02 09:15", dec!(99), dec!(97), dec!(98)),
            bar("2024-01-02 09:20", dec!(99.5), dec!(97), dec!(98)),
        ]
    }

    fn engine() -> StrategyEngine {
        StrategyEngine::new(test_config()).unwrap()
    }

    #[test]
    fn test_triggers_after_session() {
        let mut e = engine();
        for b in session_bars() {
            assert!(e.advance(&b).unwrap().is_none());
        }
        let levels = e.triggers().unwrap();
        assert_eq!(levels.buy_trigger, dec!(100.05));
        assert_eq!(levels.sell_trigger, dec!(94.9525));
        assert!(e.open_position().is_none());

        e.advance(&bar("2024-01-02 09:25", dec!(100.10), dec!(99), dec!(100)))
            .unwrap();
        let pos = e.open_position().unwrap();
        assert_eq!(pos.entry_price, dec!(100.05));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut e = engine();
        e.advance(&bar("2024-01-02 08:15", dec!(98), dec!(96), dec!(97)))
            .unwrap();
        let err = e
            .advance(&bar("2024-01-02 08:15", dec!(98), dec!(96), dec!(97)))
            .unwrap_err();
        assert!(matches!(err, EngineError::OutOfOrder { .. }));
        assert_eq!(e.bars_processed(), 1);
    }

    #[test]
    fn test_malformed_bar_rejected() {
        let mut e = engine();
        let err = e
            .advance(&bar("2024-01-02 08:15", dec!(90), dec!(96), dec!(97)))
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedBar { .. }));
    }

    #[test]
    fn test_no_session_bars_no_trade() {
        let mut e = engine();
        e.advance(&bar("2024-01-02 10:00", dec!(200), dec!(1), dec!(100)))
            .unwrap();
        e.advance(&bar("2024-01-02 11:00", dec!(300), dec!(1), dec!(100)))
            .unwrap();
        assert!(e.triggers().is_none());
        assert!(e.open_position().is_none());
    }

    #[test]
    fn test_entry_bar_is_not_managed() {
        let mut e = engine();
        for b in session_bars() {
            e.advance(&b).unwrap();
        }
        // Breaks out and dips through the would-be stop on the same bar
        let out = e
            .advance(&bar("2024-01-02 09:25", dec!(100.2), dec!(99), dec!(99.5)))
            .unwrap();
        assert!(out.is_none());
        assert!(e.open_position().is_some());

        let trade = e
            .advance(&bar("2024-01-02 09:30", dec!(100), dec!(99.5), dec!(99.6)))
            .unwrap()
            .unwrap();
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
    }

    #[test]
    fn test_trailing_scenario() {
        let mut config = test_config();
        config.buffer_pct = Decimal::ZERO;
        let mut e = StrategyEngine::new(config).unwrap();
        for b in session_bars() {
            e.advance(&b).unwrap();
        }
        e.advance(&bar("2024-01-02 09:25", dec!(100.01), dec!(99.9), dec!(100)))
            .unwrap();
        assert_eq!(e.open_position().unwrap().entry_price, dec!(100));

        assert!(e
            .advance(&bar("2024-01-02 09:30", dec!(100.45), dec!(100.3), dec!(100.4)))
            .unwrap()
            .is_none());
        let trade = e
            .advance(&bar("2024-01-02 09:35", dec!(100.3), dec!(100.15), dec!(100.2)))
            .unwrap()
            .unwrap();
        assert_eq!(trade.exit_reason, ExitReason::TrailingStop);
        assert_eq!(trade.exit_price, dec!(100.20));
        assert_eq!(trade.pnl_pct, dec!(0.20));
    }

    #[test]
    fn test_rollover_closes_at_previous_close() {
        let mut e = engine();
        for b in session_bars() {
            e.advance(&b).unwrap();
        }
        e.advance(&bar("2024-01-02 09:25", dec!(100.1), dec!(99.9), dec!(100)))
            .unwrap();
        e.advance(&bar("2024-01-02 17:00", dec!(100.2), dec!(99.9), dec!(100.1)))
            .unwrap();

        let trade = e
            .advance(&bar("2024-01-03 08:15", dec!(150), dec!(140), dec!(145)))
            .unwrap()
            .unwrap();
        assert_eq!(trade.exit_reason, ExitReason::TimeExit);
        assert_eq!(trade.exit_price, dec!(100.1));
        assert_eq!(trade.date, chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert!(e.triggers().is_none());
        assert_eq!(e.days_seen(), 2);
    }

    #[test]
    fn test_mid_price_applied_once() {
        let mut config = test_config();
        config.costs = CostModel::zero();
        let mut e = StrategyEngine::new(config).unwrap();
        let quoted = bar("2024-01-02 08:15", dec!(100), dec!(95), dec!(97)).with_spread(dec!(10));
        e.advance(&quoted).unwrap();

        let range = e.session().unwrap();
        assert_eq!(range.high, Some(dec!(100.05)));
        assert_eq!(range.low, Some(dec!(95.05)));
        assert_eq!(e.last_bar().unwrap().spread, None);
    }

    #[test]
    fn test_close_open_position_and_reset() {
        let mut e = engine();
        for b in session_bars() {
            e.advance(&b).unwrap();
        }
        e.advance(&bar("2024-01-02 09:25", dec!(100.1), dec!(99.9), dec!(100)))
            .unwrap();
        let trade = e.close_open_position(ExitReason::TimeExit).unwrap();
        assert_eq!(trade.exit_price, dec!(100));
        assert!(e.close_open_position(ExitReason::TimeExit).is_none());

        let snap = e.snapshot();
        assert!(snap.traded_today);
        assert_eq!(snap.bars_processed, 5);

        e.reset();
        assert!(e.last_bar().is_none());
        assert!(e.session().is_none());
        // Earlier timestamps are accepted again after a reset
        e.advance(&bar("2024-01-01 08:15", dec!(98), dec!(96), dec!(97)))
            .unwrap();
    }

    #[test]
    fn test_deterministic_replay() {
        let mut bars = session_bars();
        bars.push(bar("2024-01-02 09:25", dec!(100.1), dec!(99.9), dec!(100)));
        bars.push(bar("2024-01-02 12:00", dec!(100.8), dec!(100.3), dec!(100.6)));

        let run = |bars: &[Bar]| {
            let mut e = engine();
            bars.iter()
                .filter_map(|b| e.advance(b).unwrap())
                .collect::<Vec<_>>()
        };
        let first = run(&bars);
        assert_eq!(first.len(), 1);
        assert_eq!(first, run(&bars));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = test_config();
        config.stop_loss_pct = Decimal::ZERO;
        assert!(StrategyEngine::new(config).is_err());
    }
}
