//! Daily session range and the breakout levels derived from it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// High/low extremes observed inside the session window for one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionRange {
    pub date: NaiveDate,
    /// `None` until a bar inside the window is observed
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub is_finalized: bool,
}

impl SessionRange {
    /// Empty range for a new day.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            high: None,
            low: None,
            is_finalized: false,
        }
    }

    /// Whether any bar contributed to the range.
    pub fn has_observations(&self) -> bool {
        self.high.is_some() && self.low.is_some()
    }

    /// Fold a bar's extremes into the range.
    pub fn extend(&mut self, high: Decimal, low: Decimal) {
        self.high = Some(self.high.map_or(high, |h| h.max(high)));
        self.low = Some(self.low.map_or(low, |l| l.min(low)));
    }

    /// Width of the range, if any bar was observed.
    pub fn width(&self) -> Option<Decimal> {
        Some(self.high? - self.low?)
    }
}

/// Breakout trigger prices for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerLevels {
    pub buy_trigger: Decimal,
    pub sell_trigger: Decimal,
}
