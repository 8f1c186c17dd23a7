//! One-screen status for the live driver.

use breakout_strategy::{EngineSnapshot, LedgerStats};

fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Render the engine snapshot and ledger totals.
pub fn render_status(symbol: &str, snapshot: &EngineSnapshot, stats: &LedgerStats) -> String {
    let mut s = String::new();

    s.push_str("───────────────────────────────────────────────────────────\n");
    s.push_str(&format!(
        "  {}  last bar {}\n",
        symbol,
        or_dash(snapshot.last_timestamp)
    ));

    match &snapshot.session {
        Some(range) => s.push_str(&format!(
            "  Session {}:   high {}  low {}  width {}  {}\n",
            range.date,
            or_dash(range.high),
            or_dash(range.low),
            or_dash(range.width()),
            if range.is_finalized { "final" } else { "building" }
        )),
        None => s.push_str("  Session:             -\n"),
    }

    if let Some(levels) = &snapshot.triggers {
        s.push_str(&format!(
            "  Triggers:            buy {}  sell {}\n",
            levels.buy_trigger.round_dp(4),
            levels.sell_trigger.round_dp(4)
        ));
    }

    match &snapshot.position {
        Some(p) => s.push_str(&format!(
            "  Position:            {} @ {}  stop {}  target {}{}\n",
            p.side,
            p.entry_price.round_dp(4),
            p.stop_price.round_dp(4),
            p.target_price.round_dp(4),
            if p.trailing_active { "  (trailing)" } else { "" }
        )),
        None if snapshot.traded_today => s.push_str("  Position:            flat (traded today)\n"),
        None => s.push_str("  Position:            flat\n"),
    }

    s.push_str(&format!(
        "  Trades: {}  Win rate: {:.1}%  Net: {:.4}%\n",
        stats.total_trades, stats.win_rate_pct, stats.net_pnl_pct
    ));
    s.push_str("───────────────────────────────────────────────────────────\n");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use breakout_core::{Position, SessionRange, Side, TriggerLevels};
    use breakout_strategy::TradeLedger;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_render_open_position() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let snapshot = EngineSnapshot {
            last_timestamp: date.and_hms_opt(10, 0, 0),
            session: Some(SessionRange {
                date,
                high: Some(dec!(100)),
                low: Some(dec!(95)),
                is_finalized: true,
            }),
            triggers: Some(TriggerLevels {
                buy_trigger: dec!(100.05),
                sell_trigger: dec!(94.9525),
            }),
            position: Some(Position {
                side: Side::Long,
                entry_price: dec!(100.05),
                entry_time: date.and_hms_opt(9, 30, 0).unwrap(),
                stop_price: dec!(99.75),
                target_price: dec!(100.75),
                trailing_active: true,
            }),
            traded_today: true,
            bars_processed: 12,
            days_seen: 1,
        };
        let stats = TradeLedger::new(dec!(100)).stats();

        let out = render_status("BTCUSDT", &snapshot, &stats);
        assert!(out.contains("BTCUSDT  last bar 2024-01-02 10:00:00"));
        assert!(out.contains("high 100  low 95  width 5  final"));
        assert!(out.contains("buy 100.05  sell 94.9525"));
        assert!(out.contains("LONG @ 100.05"));
        assert!(out.contains("(trailing)"));
        assert!(out.contains("Trades: 0"));
    }

    #[test]
    fn test_render_empty() {
        let snapshot = EngineSnapshot {
            last_timestamp: None,
            session: None,
            triggers: None,
            position: None,
            traded_today: false,
            bars_processed: 0,
            days_seen: 0,
        };
        let stats = TradeLedger::new(dec!(100)).stats();
        let out = render_status("ETHUSDT", &snapshot, &stats);
        assert!(out.contains("last bar -"));
        assert!(out.contains("flat\n"));
    }
}
