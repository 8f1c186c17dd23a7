//! Trading cost model: entry spread, round-trip fees, point cost.

use breakout_core::{EngineError, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Costs applied to entries and realized P&L.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Fee per side, percent of notional
    pub fee_pct: Decimal,
    /// Entry slippage against the trader, percent of price
    pub spread_pct: Decimal,
    /// Flat cost per trade in price points
    pub point_cost: Decimal,
}

impl CostModel {
    pub fn new(fee_pct: Decimal, spread_pct: Decimal, point_cost: Decimal) -> Self {
        Self {
            fee_pct,
            spread_pct,
            point_cost,
        }
    }

    /// No costs at all.
    pub fn zero() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.fee_pct < Decimal::ZERO
            || self.spread_pct < Decimal::ZERO
            || self.point_cost < Decimal::ZERO
        {
            return Err(EngineError::InvalidConfig(
                "costs must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Entry fill for a trigger price, moved against the trader.
    pub fn entry_fill(&self, trigger: Decimal, side: Side) -> Decimal {
        let spread = self.spread_pct / dec!(100);
        match side {
            Side::Long => trigger * (Decimal::ONE + spread),
            Side::Short => trigger * (Decimal::ONE - spread),
        }
    }

    /// Net P&L in percent: `(raw - 2 * fee) * 100`.
    pub fn pnl_pct(&self, side: Side, entry: Decimal, exit: Decimal) -> Decimal {
        if entry.is_zero() {
            return Decimal::ZERO;
        }
        let raw = side.sign() * (exit - entry) / entry;
        let round_trip_fee = dec!(2) * self.fee_pct / dec!(100);
        (raw - round_trip_fee) * dec!(100)
    }

    /// Net P&L in price points.
    pub fn pnl_points(&self, side: Side, entry: Decimal, exit: Decimal) -> Decimal {
        side.sign() * (exit - entry) - self.point_cost
    }
}
