use breakout_core::{Bar, BreakoutError, Quote};
use chrono_tz::Tz;

/// Flat bar at the quote's last price, stamped with the local wall-clock
/// time of `tz`.
pub fn bar_from_quote(quote: &Quote, tz: Tz) -> Bar {
    let local = quote.timestamp.with_timezone(&tz).naive_local();
    Bar::from_price(local, quote.last)
}

/// Parse an IANA time zone name such as `Asia/Kolkata`.
pub fn parse_timezone(name: &str) -> Result<Tz, BreakoutError> {
    name.parse::<Tz>()
        .map_err(|e| BreakoutError::Config(format!("unknown time zone '{name}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_to_local_bar() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();
        let quote = Quote::last_only("BTCUSDT", dec!(42000.5), ts);
        let tz = parse_timezone("Asia/Kolkata").unwrap();

        let bar = bar_from_quote(&quote, tz);
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(bar.timestamp, expected);
        assert_eq!(bar.open, dec!(42000.5));
        assert_eq!(bar.high, bar.low);
        assert_eq!(bar.spread, None);
    }

    #[test]
    fn test_unknown_zone() {
        assert!(matches!(
            parse_timezone("Mars/Olympus"),
            Err(BreakoutError::Config(_))
        ));
    }
}
