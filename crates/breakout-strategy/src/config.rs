//! Strategy parameters.
//!
//! The state machine carries no defaults of its own; the configuration layer
//! supplies every value.

use breakout_core::EngineError;
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::costs::CostModel;

/// Resolution when a single bar touches both the stop and the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    /// Assume the adverse move happened first
    #[default]
    StopFirst,
    TargetFirst,
}

/// Resolution when a single bar crosses both breakout triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DualTriggerPolicy {
    #[default]
    LongFirst,
    ShortFirst,
    /// Stay flat on that bar
    Skip,
}

/// Complete parameter set for the breakout strategy.
///
/// Percent-valued fields are in percent units: `0.05` means 0.05%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// First time-of-day included in the session range
    pub session_start: NaiveTime,
    /// Last time-of-day included in the session range
    pub session_end: NaiveTime,
    /// Last time-of-day an entry may fire
    pub entry_deadline: NaiveTime,
    /// Time-of-day an open position is force-closed
    pub exit_deadline: NaiveTime,
    pub buffer_pct: Decimal,
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    /// Favorable move that arms the trailing stop
    pub trail_activate_pct: Decimal,
    /// Profit locked in once the trailing stop is armed
    pub trail_lock_pct: Decimal,
    pub costs: CostModel,
    /// Scales a quoted spread (in points) to price units
    pub point_multiplier: Decimal,
    #[serde(default)]
    pub tie_break: TieBreakPolicy,
    #[serde(default)]
    pub dual_trigger: DualTriggerPolicy,
}

impl StrategyConfig {
    /// Check time ordering and parameter signs.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: &str| Err(EngineError::InvalidConfig(msg.into()));

        if self.session_start > self.session_end {
            return invalid("session_start must not be after session_end");
        }
        if self.entry_deadline <= self.session_end {
            return invalid("entry_deadline must be after session_end");
        }
        if self.exit_deadline < self.entry_deadline {
            return invalid("exit_deadline must not be before entry_deadline");
        }
        if self.buffer_pct < Decimal::ZERO {
            return invalid("buffer_pct must not be negative");
        }
        if self.stop_loss_pct <= Decimal::ZERO {
            return invalid("stop_loss_pct must be positive");
        }
        if self.take_profit_pct <= Decimal::ZERO {
            return invalid("take_profit_pct must be positive");
        }
        if self.trail_activate_pct <= Decimal::ZERO {
            return invalid("trail_activate_pct must be positive");
        }
        if self.trail_lock_pct < Decimal::ZERO || self.trail_lock_pct >= self.trail_activate_pct {
            return invalid("trail_lock_pct must be in [0, trail_activate_pct)");
        }
        if self.point_multiplier < Decimal::ZERO {
            return invalid("point_multiplier must not be negative");
        }
        self.costs.validate()
    }

    /// Whether a time-of-day lies inside the entry window `(session_end, entry_deadline]`.
    pub fn in_entry_window(&self, time: NaiveTime) -> bool {
        time > self.session_end && time <= self.entry_deadline
    }
}
