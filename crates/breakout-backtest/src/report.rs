//! Backtest report generation.

use breakout_core::{BreakoutError, BreakoutResult, Trade};
use breakout_strategy::{LedgerStats, StrategyConfig};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::BacktestConfig;

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Configuration used
    pub config: BacktestConfig,
    /// Strategy parameters used
    pub strategy: StrategyConfig,
    /// Statistics
    pub stats: LedgerStats,
    /// Compounded equity, seed first
    pub equity_curve: Vec<Decimal>,
    /// Absolute drawdown at each equity point
    pub drawdown_abs: Vec<Decimal>,
    /// Closed trades in order
    pub trades: Vec<Trade>,
    pub bars_processed: u64,
    /// Calendar days present in the data
    pub days_seen: u64,
    /// Days on which a trade was opened
    pub trading_days: usize,
    pub first_bar: Option<NaiveDateTime>,
    pub last_bar: Option<NaiveDateTime>,
}

/// One row of the trades CSV export.
#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    date: String,
    side: String,
    entry_time: String,
    entry_price: &'a Decimal,
    exit_time: String,
    exit_price: &'a Decimal,
    reason: String,
    pnl_pct: Decimal,
    pnl_points: &'a Decimal,
}

impl<'a> From<&'a Trade> for TradeRow<'a> {
    fn from(t: &'a Trade) -> Self {
        Self {
            date: t.date.to_string(),
            side: t.side().to_string(),
            entry_time: t.position.entry_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry_price: &t.position.entry_price,
            exit_time: t.exit_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            exit_price: &t.exit_price,
            reason: t.exit_reason.to_string(),
            pnl_pct: t.pnl_pct.round_dp(6),
            pnl_points: &t.pnl_points,
        }
    }
}

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let period = match (self.first_bar, self.last_bar) {
            (Some(a), Some(b)) => format!("{} .. {}", a.date(), b.date()),
            _ => "no data".to_string(),
        };

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                 SESSION BREAKOUT BACKTEST                  \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("DATA\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        if !self.config.symbol.is_empty() {
            s.push_str(&format!("  Symbol:              {}\n", self.config.symbol));
        }
        s.push_str(&format!("  Period:              {}\n", period));
        s.push_str(&format!("  Bars Processed:      {}\n", self.bars_processed));
        s.push_str(&format!("  Days In Data:        {}\n", self.days_seen));
        s.push_str(&format!("  Days Traded:         {}\n", self.trading_days));
        s.push('\n');

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Starting Equity:     {:.2}\n",
            self.stats.starting_equity
        ));
        s.push_str(&format!("  Final Equity:        {:.2}\n", self.stats.final_equity));
        s.push_str(&format!(
            "  Total Return:        {:.2}%\n",
            self.stats.total_return_pct
        ));
        s.push_str(&format!("  Net P&L:             {:.4}%\n", self.stats.net_pnl_pct));
        s.push_str(&format!(
            "  Net P&L (points):    {:.4}\n",
            self.stats.net_pnl_points
        ));
        s.push_str(&format!(
            "  Max Drawdown:        {:.2}% ({:.4})\n",
            self.stats.max_drawdown_pct, self.stats.max_drawdown_abs
        ));
        s.push_str(&format!("  Profit Factor:       {:.2}\n", self.stats.profit_factor));
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Total Trades:        {}\n", self.stats.total_trades));
        s.push_str(&format!(
            "  Long / Short:        {} / {}\n",
            self.stats.long_trades, self.stats.short_trades
        ));
        s.push_str(&format!("  Winning Trades:      {}\n", self.stats.winning_trades));
        s.push_str(&format!("  Losing Trades:       {}\n", self.stats.losing_trades));
        s.push_str(&format!(
            "  Breakeven Trades:    {}\n",
            self.stats.breakeven_trades
        ));
        s.push_str(&format!("  Win Rate:            {:.2}%\n", self.stats.win_rate_pct));
        s.push_str(&format!("  Avg Win:             {:.4}%\n", self.stats.avg_win_pct));
        s.push_str(&format!("  Avg Loss:            {:.4}%\n", self.stats.avg_loss_pct));
        s.push('\n');

        s.push_str("EXIT REASONS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        for (reason, count) in &self.stats.exit_reasons {
            s.push_str(&format!("  {:<21}{}\n", format!("{}:", reason), count));
        }
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the trade list as CSV.
    pub fn write_trades_csv<W: std::io::Write>(&self, writer: W) -> BreakoutResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for trade in &self.trades {
            wtr.serialize(TradeRow::from(trade))
                .map_err(|e| BreakoutError::Serialization(e.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Trade list as a CSV string.
    pub fn trades_to_csv(&self) -> BreakoutResult<String> {
        let mut buf = Vec::new();
        self.write_trades_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| BreakoutError::Serialization(e.to_string()))
    }

    /// Export to CSV (equity curve only).
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("trade,date,equity,drawdown\n");
        for (i, equity) in self.equity_curve.iter().enumerate() {
            let date = match i.checked_sub(1).and_then(|j| self.trades.get(j)) {
                Some(t) => t.exit_time.date().to_string(),
                None => String::new(),
            };
            let drawdown = self.drawdown_abs.get(i).copied().unwrap_or_default();
            csv.push_str(&format!("{},{},{},{}\n", i, date, equity, drawdown));
        }
        csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::tests::{sample_bars, strategy_config};
    use crate::Backtester;

    fn report() -> BacktestReport {
        Backtester::new(strategy_config(), BacktestConfig::default())
            .run(&sample_bars())
            .unwrap()
    }

    #[test]
    fn test_report_summary() {
        let summary = report().summary();
        assert!(summary.contains("Total Trades:        2"));
        assert!(summary.contains("Period:              2024-01-02 .. 2024-01-04"));
        assert!(summary.contains("target:"));
    }

    #[test]
    fn test_trades_csv() {
        let csv = report().trades_to_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,side,entry_time,entry_price,exit_time,exit_price,reason,pnl_pct,pnl_points"
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("2024-01-02,LONG,2024-01-02 10:00:00,"));
        assert!(first.contains(",target,"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_equity_csv_and_json() {
        let r = report();
        let csv = r.equity_to_csv();
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.starts_with("trade,date,equity,drawdown\n0,,100,0\n"));

        let json = r.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["trades"].as_array().unwrap().len(), 2);
        assert_eq!(value["trades"][0]["exit_reason"], "target");
    }
}
