//! End-to-end replay over CSV files.

use breakout_backtest::{BacktestConfig, Backtester};
use breakout_config::StrategySettings;
use breakout_core::{DataError, ExitReason, Side};
use breakout_data::{load_csv, BarFormat, LoadOptions};
use breakout_strategy::StrategyConfig;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn default_strategy() -> StrategyConfig {
    StrategySettings::default().to_strategy_config().unwrap()
}

const GENERIC: &str = "\
datetime,open,high,low,close
2024-01-02 08:15:00,99.5,100,99,99.5
2024-01-02 08:45:00,99,99,95,96
2024-01-02 09:30:00,99.9,100.2,99.8,100.1
2024-01-02 10:00:00,100.4,100.9,100.3,100.8
2024-01-03 08:15:00,100,100.5,99.5,100
2024-01-03 08:45:00,100,100.2,99.8,100.1
2024-01-03 12:00:00,100,100.1,99.9,100
";

#[test]
fn test_generic_csv_replay() {
    let file = write_csv(GENERIC);
    let bars = load_csv(file.path(), &LoadOptions::default()).unwrap();
    assert_eq!(bars.len(), 7);

    let report = Backtester::new(default_strategy(), BacktestConfig::default())
        .run(&bars)
        .unwrap();

    assert_eq!(report.days_seen, 2);
    assert_eq!(report.trading_days, 1);
    assert_eq!(report.stats.total_trades, 1);

    let trade = &report.trades[0];
    assert_eq!(trade.side(), Side::Long);
    assert_eq!(trade.exit_reason, ExitReason::Target);
    // buy trigger 100.05 plus 0.02% spread
    assert_eq!(trade.entry_price(), dec!(100.07001));
    assert!(trade.is_win());
    assert_eq!(report.equity_curve.len(), 2);
}

#[test]
fn test_mt5_export_with_shift_and_spread() {
    // Server time two hours behind the reference zone; spread in points.
    let file = write_csv(
        "<DATE>\t<TIME>\t<OPEN>\t<HIGH>\t<LOW>\t<CLOSE>\t<TICKVOL>\t<VOL>\t<SPREAD>\n\
         2024.01.02\t06:15:00\t100\t100\t99\t99.5\t10\t0\t20\n\
         2024.01.02\t06:45:00\t99\t99\t95\t96\t10\t0\t20\n\
         2024.01.02\t07:30:00\t100\t100.3\t99.9\t100.2\t10\t0\t20\n\
         2024.01.02\t17:30:00\t100\t100.1\t99.9\t100\t10\t0\t20\n",
    );
    let options = LoadOptions::new(BarFormat::Mt5).with_shift_minutes(120);
    let bars = load_csv(file.path(), &options).unwrap();
    assert_eq!(
        bars[0].timestamp,
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap()
    );

    let report = Backtester::new(default_strategy(), BacktestConfig::default())
        .run(&bars)
        .unwrap();
    assert_eq!(report.trades.len(), 1);

    let trade = &report.trades[0];
    // mid-price range high 100.1, buy trigger 100.15005, plus 0.02% spread
    assert_eq!(trade.entry_price(), dec!(100.17008001));
    assert_eq!(trade.exit_reason, ExitReason::TimeExit);
    assert_eq!(trade.exit_price, dec!(100.1));
    assert!(trade.is_loss());
}

#[test]
fn test_date_filter_outside_data_gives_empty_report() {
    let file = write_csv(GENERIC);
    let from = NaiveDate::from_ymd_opt(2025, 1, 1);
    let options = LoadOptions::new(BarFormat::Generic).with_range(from, None);
    let bars = load_csv(file.path(), &options).unwrap();
    assert!(bars.is_empty());

    let report = Backtester::new(default_strategy(), BacktestConfig::default())
        .run(&bars)
        .unwrap();
    assert_eq!(report.stats.total_trades, 0);
    assert_eq!(report.stats.final_equity, dec!(100));
    assert!(report.summary().contains("no data"));
}

#[test]
fn test_duplicate_timestamps_rejected() {
    let file = write_csv(
        "datetime,open,high,low,close\n\
         2024-01-02 08:15:00,100,101,99,100\n\
         2024-01-02 08:15:00,100,101,99,100\n",
    );
    let result = load_csv(file.path(), &LoadOptions::default());
    assert!(matches!(result, Err(DataError::Duplicate(_))));
}

#[test]
fn test_trades_csv_export_to_file() {
    let file = write_csv(GENERIC);
    let bars = load_csv(file.path(), &LoadOptions::default()).unwrap();
    let report = Backtester::new(default_strategy(), BacktestConfig::default())
        .run(&bars)
        .unwrap();

    let out = NamedTempFile::new().unwrap();
    report.write_trades_csv(out.reopen().unwrap()).unwrap();
    let written = std::fs::read_to_string(out.path()).unwrap();
    let mut lines = written.lines();
    assert!(lines.next().unwrap().starts_with("date,side,entry_time"));
    assert!(lines.next().unwrap().contains(",LONG,"));
    assert!(lines.next().is_none());
}
