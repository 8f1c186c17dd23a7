//! Stop, target and trailing-stop arithmetic.

use breakout_core::{Bar, Position, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::StrategyConfig;

/// Fixed-percentage exit levels with a one-shot trailing lock.
#[derive(Debug, Clone, Copy)]
pub struct ExitRules {
    stop_loss_pct: Decimal,
    take_profit_pct: Decimal,
    trail_activate_pct: Decimal,
    trail_lock_pct: Decimal,
}

impl ExitRules {
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            stop_loss_pct: config.stop_loss_pct,
            take_profit_pct: config.take_profit_pct,
            trail_activate_pct: config.trail_activate_pct,
            trail_lock_pct: config.trail_lock_pct,
        }
    }

    /// Price `pct` percent away from `entry`, in favor (`+`) or against (`-`)
    /// the position.
    fn offset(entry: Decimal, side: Side, pct: Decimal, favorable: bool) -> Decimal {
        let delta = entry * (pct / dec!(100));
        let signed = if favorable { delta } else { -delta };
        entry + side.sign() * signed
    }

    /// Initial stop price for a new position.
    pub fn stop_price(&self, entry: Decimal, side: Side) -> Decimal {
        Self::offset(entry, side, self.stop_loss_pct, false)
    }

    /// Target price for a new position.
    pub fn target_price(&self, entry: Decimal, side: Side) -> Decimal {
        Self::offset(entry, side, self.take_profit_pct, true)
    }

    /// Price the bar must reach to arm the trailing stop.
    pub fn activation_price(&self, entry: Decimal, side: Side) -> Decimal {
        Self::offset(entry, side, self.trail_activate_pct, true)
    }

    /// Stop level once trailing is armed.
    pub fn locked_stop(&self, entry: Decimal, side: Side) -> Decimal {
        Self::offset(entry, side, self.trail_lock_pct, true)
    }

    /// Arm the trailing stop if the bar moved far enough in favor.
    ///
    /// Returns `true` when the stop was changed. The stop never loosens and
    /// arming happens at most once per position.
    pub fn update_trailing(&self, position: &mut Position, bar: &Bar) -> bool {
        if position.trailing_active {
            return false;
        }

        let activation = self.activation_price(position.entry_price, position.side);
        let reached = match position.side {
            Side::Long => bar.high >= activation,
            Side::Short => bar.low <= activation,
        };
        if !reached {
            return false;
        }

        let locked = self.locked_stop(position.entry_price, position.side);
        position.stop_price = match position.side {
            Side::Long => position.stop_price.max(locked),
            Side::Short => position.stop_price.min(locked),
        };
        position.trailing_active = true;
        true
    }
}

/// Check if the bar touched the stop.
pub fn stop_hit(position: &Position, bar: &Bar) -> bool {
    match position.side {
        Side::Long => bar.low <= position.stop_price,
        Side::Short => bar.high >= position.stop_price,
    }
}

/// Check if the bar touched the target.
pub fn target_hit(position: &Position, bar: &Bar) -> bool {
    match position.side {
        Side::Long => bar.high >= position.target_price,
        Side::Short => bar.low <= position.target_price,
    }
}
