//! Price bar type and the spread-to-mid-price transform.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// OHLC sample at a timestamp in the reference time zone.
///
/// A quoted bar may carry the broker spread (in points). The engine turns it
/// into an execution bar with [`MidPriceAdjustment::apply`] exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar timestamp (reference time zone)
    pub timestamp: NaiveDateTime,
    /// Opening price
    pub open: Decimal,
    /// Highest price
    pub high: Decimal,
    /// Lowest price
    pub low: Decimal,
    /// Closing price
    pub close: Decimal,
    /// Quoted spread in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<Decimal>,
}

impl Bar {
    /// Create a new bar without spread.
    pub fn new(
        timestamp: NaiveDateTime,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            spread: None,
        }
    }

    /// Attach a quoted spread.
    pub fn with_spread(mut self, spread: Decimal) -> Self {
        self.spread = Some(spread);
        self
    }

    /// Flat bar from a single price (live ticks).
    pub fn from_price(timestamp: NaiveDateTime, price: Decimal) -> Self {
        Self::new(timestamp, price, price, price, price)
    }

    /// Calendar date of the bar.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Time of day of the bar.
    #[inline]
    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }

    /// Check the structural bar contract: positive prices, `low <= high`,
    /// non-negative spread.
    pub fn validate(&self) -> Result<(), EngineError> {
        let malformed = |reason: &str| EngineError::MalformedBar {
            timestamp: self.timestamp,
            reason: reason.to_string(),
        };

        if self.open <= Decimal::ZERO
            || self.high <= Decimal::ZERO
            || self.low <= Decimal::ZERO
            || self.close <= Decimal::ZERO
        {
            return Err(malformed("prices must be positive"));
        }
        if self.low > self.high {
            return Err(malformed("low is above high"));
        }
        if matches!(self.spread, Some(s) if s < Decimal::ZERO) {
            return Err(malformed("spread is negative"));
        }
        Ok(())
    }
}

/// Converts quoted prices into execution mid-prices.
///
/// `mid = quoted + spread * point_multiplier / 2` for high, low and close.
/// The open is left untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidPriceAdjustment {
    pub point_multiplier: Decimal,
}

impl MidPriceAdjustment {
    pub fn new(point_multiplier: Decimal) -> Self {
        Self { point_multiplier }
    }

    /// Price offset for a given spread.
    #[inline]
    pub fn offset(&self, spread: Decimal) -> Decimal {
        spread * self.point_multiplier / Decimal::TWO
    }

    /// Apply the adjustment. The returned bar no longer carries a spread,
    /// so applying twice is a no-op.
    pub fn apply(&self, bar: &Bar) -> Bar {
        match bar.spread {
            Some(spread) => {
                let offset = self.offset(spread);
                Bar {
                    timestamp: bar.timestamp,
                    open: bar.open,
                    high: bar.high + offset,
                    low: bar.low + offset,
                    close: bar.close + offset,
                    spread: None,
                }
            }
            None => *bar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_mid_price_adjustment() {
        let bar = Bar::new(ts("2024-01-02 08:15"), dec!(2000), dec!(2001), dec!(1999), dec!(2000.5))
            .with_spread(dec!(20));
        let adj = MidPriceAdjustment::new(dec!(0.01));

        let mid = adj.apply(&bar);
        assert_eq!(mid.open, dec!(2000));
        assert_eq!(mid.high, dec!(2001.1));
        assert_eq!(mid.low, dec!(1999.1));
        assert_eq!(mid.close, dec!(2000.6));
        assert_eq!(mid.spread, None);

        // Second application changes nothing
        assert_eq!(adj.apply(&mid), mid);
    }

    #[test]
    fn test_bar_without_spread_is_unchanged() {
        let bar = Bar::new(ts("2024-01-02 08:15"), dec!(10), dec!(11), dec!(9), dec!(10));
        assert_eq!(MidPriceAdjustment::new(dec!(0.01)).apply(&bar), bar);
    }

    #[test]
    fn test_bar_validation() {
        let t = ts("2024-01-02 08:15");
        assert!(Bar::new(t, dec!(10), dec!(11), dec!(9), dec!(10)).validate().is_ok());
        assert!(Bar::new(t, dec!(10), dec!(9), dec!(11), dec!(10)).validate().is_err());
        assert!(Bar::new(t, dec!(0), dec!(11), dec!(9), dec!(10)).validate().is_err());
        assert!(Bar::new(t, dec!(10), dec!(11), dec!(9), dec!(10))
            .with_spread(dec!(-1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_price() {
        let bar = Bar::from_price(ts("2024-01-02 10:00"), dec!(42));
        assert_eq!(bar.high, bar.low);
        assert_eq!(bar.date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }
}
