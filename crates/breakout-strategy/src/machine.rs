//! Position lifecycle: entry, stop/target/trailing management, time exit.

use breakout_core::{Bar, ExitReason, Position, Side, Trade, TriggerLevels};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::{DualTriggerPolicy, StrategyConfig, TieBreakPolicy};
use crate::costs::CostModel;
use crate::exits::{stop_hit, target_hit, ExitRules};

/// Current state of the machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    Flat,
    Open(Position),
}

/// Owns at most one position and enforces one entry per day.
#[derive(Debug, Clone)]
pub struct PositionStateMachine {
    config: StrategyConfig,
    rules: ExitRules,
    costs: CostModel,
    state: PositionState,
    trading_date: Option<NaiveDate>,
    traded_today: bool,
}

impl PositionStateMachine {
    pub fn new(config: StrategyConfig) -> Self {
        let rules = ExitRules::from_config(&config);
        let costs = config.costs;
        Self {
            config,
            rules,
            costs,
            state: PositionState::Flat,
            trading_date: None,
            traded_today: false,
        }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn position(&self) -> Option<&Position> {
        match &self.state {
            PositionState::Open(p) => Some(p),
            PositionState::Flat => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PositionState::Open(_))
    }

    /// Whether today's entry has been used.
    pub fn traded_today(&self) -> bool {
        self.traded_today
    }

    /// Clear the daily cap for a new trading day.
    ///
    /// The caller closes any position from the previous day first.
    pub fn start_day(&mut self, date: NaiveDate) {
        self.trading_date = Some(date);
        self.traded_today = false;
    }

    /// Try to open a position on this bar.
    ///
    /// Fires only from Flat, once per day, inside the entry window.
    pub fn try_enter(&mut self, bar: &Bar, levels: &TriggerLevels) -> Option<Position> {
        if self.is_open() || self.traded_today {
            return None;
        }
        if self.trading_date != Some(bar.date()) || !self.config.in_entry_window(bar.time()) {
            return None;
        }

        let long = bar.high >= levels.buy_trigger;
        let short = bar.low <= levels.sell_trigger;
        let side = match (long, short) {
            (true, false) => Side::Long,
            (false, true) => Side::Short,
            (true, true) => match self.config.dual_trigger {
                DualTriggerPolicy::LongFirst => Side::Long,
                DualTriggerPolicy::ShortFirst => Side::Short,
                DualTriggerPolicy::Skip => {
                    debug!(timestamp = %bar.timestamp, "both triggers crossed, skipping bar");
                    return None;
                }
            },
            (false, false) => return None,
        };

        let trigger = match side {
            Side::Long => levels.buy_trigger,
            Side::Short => levels.sell_trigger,
        };
        let entry_price = self.costs.entry_fill(trigger, side);
        let position = Position {
            side,
            entry_price,
            entry_time: bar.timestamp,
            stop_price: self.rules.stop_price(entry_price, side),
            target_price: self.rules.target_price(entry_price, side),
            trailing_active: false,
        };

        info!(
            %side,
            entry = %position.entry_price,
            stop = %position.stop_price,
            target = %position.target_price,
            time = %bar.timestamp,
            "position opened"
        );

        self.state = PositionState::Open(position);
        self.traded_today = true;
        Some(position)
    }

    /// Manage the open position against a bar after the entry bar.
    ///
    /// Order: time cutoff past the deadline, trailing activation, stop/target
    /// with the tie-break policy, then the time exit at the deadline itself.
    pub fn manage(&mut self, bar: &Bar) -> Option<Trade> {
        let time = bar.time();
        let exit_deadline = self.config.exit_deadline;
        let tie_break = self.config.tie_break;

        let decision = {
            let PositionState::Open(position) = &mut self.state else {
                return None;
            };

            if time > exit_deadline {
                Some((bar.close, ExitReason::TimeExit))
            } else {
                if self.rules.update_trailing(position, bar) {
                    info!(stop = %position.stop_price, "trailing stop armed");
                }

                let stop_reason = if position.trailing_active {
                    ExitReason::TrailingStop
                } else {
                    ExitReason::StopLoss
                };
                let stop = stop_hit(position, bar).then_some((position.stop_price, stop_reason));
                let target =
                    target_hit(position, bar).then_some((position.target_price, ExitReason::Target));

                let hit = match (stop, target) {
                    (Some(s), Some(t)) => match tie_break {
                        TieBreakPolicy::StopFirst => Some(s),
                        TieBreakPolicy::TargetFirst => Some(t),
                    },
                    (s, t) => s.or(t),
                };

                match hit {
                    Some(exit) => Some(exit),
                    None if time == exit_deadline => Some((bar.close, ExitReason::TimeExit)),
                    None => None,
                }
            }
        };

        let (price, reason) = decision?;
        self.close(price, bar.timestamp, reason)
    }

    /// Close the open position unconditionally.
    pub fn force_close(
        &mut self,
        price: Decimal,
        time: NaiveDateTime,
        reason: ExitReason,
    ) -> Option<Trade> {
        self.close(price, time, reason)
    }

    fn close(&mut self, price: Decimal, time: NaiveDateTime, reason: ExitReason) -> Option<Trade> {
        let PositionState::Open(position) = std::mem::replace(&mut self.state, PositionState::Flat)
        else {
            return None;
        };

        let trade = Trade {
            date: position.entry_time.date(),
            position,
            exit_price: price,
            exit_time: time,
            exit_reason: reason,
            pnl_pct: self.costs.pnl_pct(position.side, position.entry_price, price),
            pnl_points: self.costs.pnl_points(position.side, position.entry_price, price),
        };

        info!(
            side = %position.side,
            exit = %price,
            %reason,
            pnl_pct = %trade.pnl_pct.round_dp(4),
            "position closed"
        );
        Some(trade)
    }

    /// Return to the initial state.
    pub fn reset(&mut self) {
        self.state = PositionState::Flat;
        self.trading_date = None;
        self.traded_today = false;
    }
}
