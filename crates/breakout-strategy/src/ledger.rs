//! Append-only trade ledger and derived statistics.

use std::collections::BTreeMap;

use breakout_core::{ExitReason, Side, Trade};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Closed trades in the order they happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLedger {
    starting_equity: Decimal,
    trades: Vec<Trade>,
}

/// Summary statistics over a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub long_trades: usize,
    pub short_trades: usize,
    /// Win rate percentage
    pub win_rate_pct: Decimal,
    pub net_pnl_pct: Decimal,
    pub net_pnl_points: Decimal,
    /// Average pnl_pct of winners
    pub avg_win_pct: Decimal,
    /// Average pnl_pct of losers (negative)
    pub avg_loss_pct: Decimal,
    /// Gross profit / gross loss, zero when there are no losers
    pub profit_factor: Decimal,
    pub starting_equity: Decimal,
    pub final_equity: Decimal,
    pub total_return_pct: Decimal,
    pub max_drawdown_abs: Decimal,
    pub max_drawdown_pct: Decimal,
    pub exit_reasons: BTreeMap<String, usize>,
}

impl TradeLedger {
    pub fn new(starting_equity: Decimal) -> Self {
        Self {
            starting_equity,
            trades: Vec::new(),
        }
    }

    /// Record a closed trade.
    pub fn append(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn starting_equity(&self) -> Decimal {
        self.starting_equity
    }

    pub fn net_pnl_pct(&self) -> Decimal {
        self.trades.iter().map(|t| t.pnl_pct).sum()
    }

    pub fn net_pnl_points(&self) -> Decimal {
        self.trades.iter().map(|t| t.pnl_points).sum()
    }

    /// Share of trades with positive pnl, in percent. Zero for an empty ledger.
    pub fn win_rate_pct(&self) -> Decimal {
        if self.trades.is_empty() {
            return Decimal::ZERO;
        }
        let wins = self.trades.iter().filter(|t| t.is_win()).count();
        Decimal::from(wins) / Decimal::from(self.trades.len()) * dec!(100)
    }

    /// Compounded equity, one point per trade plus the seed.
    pub fn equity_curve(&self) -> Vec<Decimal> {
        let mut curve = Vec::with_capacity(self.trades.len() + 1);
        let mut equity = self.starting_equity;
        curve.push(equity);
        for trade in &self.trades {
            equity *= Decimal::ONE + trade.pnl_pct / dec!(100);
            curve.push(equity);
        }
        curve
    }

    /// Running maximum of the equity curve.
    pub fn running_peak(&self) -> Vec<Decimal> {
        let mut peak = Decimal::MIN;
        self.equity_curve()
            .into_iter()
            .map(|e| {
                peak = peak.max(e);
                peak
            })
            .collect()
    }

    /// `peak - equity` at each point.
    pub fn drawdown_abs(&self) -> Vec<Decimal> {
        self.equity_curve()
            .into_iter()
            .zip(self.running_peak())
            .map(|(e, p)| p - e)
            .collect()
    }

    /// `(peak - equity) / peak * 100` at each point.
    pub fn drawdown_pct(&self) -> Vec<Decimal> {
        self.equity_curve()
            .into_iter()
            .zip(self.running_peak())
            .map(|(e, p)| {
                if p > Decimal::ZERO {
                    (p - e) / p * dec!(100)
                } else {
                    Decimal::ZERO
                }
            })
            .collect()
    }

    pub fn max_drawdown_abs(&self) -> Decimal {
        self.drawdown_abs().into_iter().max().unwrap_or(Decimal::ZERO)
    }

    pub fn max_drawdown_pct(&self) -> Decimal {
        self.drawdown_pct().into_iter().max().unwrap_or(Decimal::ZERO)
    }

    pub fn count_by_reason(&self, reason: ExitReason) -> usize {
        self.trades.iter().filter(|t| t.exit_reason == reason).count()
    }

    /// Compute all summary statistics.
    pub fn stats(&self) -> LedgerStats {
        let winners: Vec<Decimal> = self
            .trades
            .iter()
            .filter(|t| t.is_win())
            .map(|t| t.pnl_pct)
            .collect();
        let losers: Vec<Decimal> = self
            .trades
            .iter()
            .filter(|t| t.is_loss())
            .map(|t| t.pnl_pct)
            .collect();

        let gross_profit: Decimal = winners.iter().copied().sum();
        let gross_loss: Decimal = losers.iter().copied().sum::<Decimal>().abs();

        let avg = |values: &[Decimal]| {
            if values.is_empty() {
                Decimal::ZERO
            } else {
                values.iter().copied().sum::<Decimal>() / Decimal::from(values.len())
            }
        };

        let final_equity = self
            .equity_curve()
            .last()
            .copied()
            .unwrap_or(self.starting_equity);
        let total_return_pct = if self.starting_equity > Decimal::ZERO {
            (final_equity - self.starting_equity) / self.starting_equity * dec!(100)
        } else {
            Decimal::ZERO
        };

        let exit_reasons = ExitReason::ALL
            .iter()
            .map(|r| (r.to_string(), self.count_by_reason(*r)))
            .collect();

        LedgerStats {
            total_trades: self.trades.len(),
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            breakeven_trades: self.trades.len() - winners.len() - losers.len(),
            long_trades: self.trades.iter().filter(|t| t.side() == Side::Long).count(),
            short_trades: self.trades.iter().filter(|t| t.side() == Side::Short).count(),
            win_rate_pct: self.win_rate_pct(),
            net_pnl_pct: self.net_pnl_pct(),
            net_pnl_points: self.net_pnl_points(),
            avg_win_pct: avg(&winners),
            avg_loss_pct: avg(&losers),
            profit_factor: if gross_loss > Decimal::ZERO {
                gross_profit / gross_loss
            } else {
                Decimal::ZERO
            },
            starting_equity: self.starting_equity,
            final_equity,
            total_return_pct,
            max_drawdown_abs: self.max_drawdown_abs(),
            max_drawdown_pct: self.max_drawdown_pct(),
            exit_reasons,
        }
    }
}
