//! Breakout trigger levels.

use breakout_core::{EngineError, SessionRange, TriggerLevels};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Derives buy/sell triggers from a finalized range.
#[derive(Debug, Clone, Copy)]
pub struct TriggerCalculator {
    buffer_pct: Decimal,
}

impl TriggerCalculator {
    pub fn new(buffer_pct: Decimal) -> Self {
        Self { buffer_pct }
    }

    /// `buy = high * (1 + buffer)`, `sell = low * (1 - buffer)`.
    pub fn compute(&self, range: &SessionRange) -> Result<TriggerLevels, EngineError> {
        let not_ready = || EngineError::RangeNotFinalized { date: range.date };
        if !range.is_finalized {
            return Err(not_ready());
        }
        let (high, low) = match (range.high, range.low) {
            (Some(h), Some(l)) => (h, l),
            _ => return Err(not_ready()),
        };

        let buffer = self.buffer_pct / dec!(100);
        Ok(TriggerLevels {
            buy_trigger: high * (Decimal::ONE + buffer),
            sell_trigger: low * (Decimal::ONE - buffer),
        })
    }
}
