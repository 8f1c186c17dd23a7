//! Position and closed-trade types.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OrderSide;

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Long => Decimal::ONE,
            Side::Short => -Decimal::ONE,
        }
    }

    /// Order side that opens a position in this direction.
    pub fn entry_order_side(&self) -> OrderSide {
        match self {
            Side::Long => OrderSide::Buy,
            Side::Short => OrderSide::Sell,
        }
    }

    /// Order side that closes a position in this direction.
    pub fn exit_order_side(&self) -> OrderSide {
        self.entry_order_side().opposite()
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Target,
    StopLoss,
    TrailingStop,
    TimeExit,
}

impl ExitReason {
    pub const ALL: [ExitReason; 4] = [
        ExitReason::Target,
        ExitReason::StopLoss,
        ExitReason::TrailingStop,
        ExitReason::TimeExit,
    ];
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Target => write!(f, "target"),
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TrailingStop => write!(f, "trailing_stop"),
            ExitReason::TimeExit => write!(f, "time_exit"),
        }
    }
}

/// An open position. At most one exists at a time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    /// Fill price including the entry spread cost
    pub entry_price: Decimal,
    pub entry_time: NaiveDateTime,
    /// Current stop; only ever tightens
    pub stop_price: Decimal,
    pub target_price: Decimal,
    pub trailing_active: bool,
}

/// A closed position. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Trading day the position was opened on
    pub date: NaiveDate,
    #[serde(flatten)]
    pub position: Position,
    pub exit_price: Decimal,
    pub exit_time: NaiveDateTime,
    pub exit_reason: ExitReason,
    /// Percent of entry notional, net of round-trip fees
    pub pnl_pct: Decimal,
    /// Price points, net of the point cost
    pub pnl_points: Decimal,
}

impl Trade {
    pub fn side(&self) -> Side {
        self.position.side
    }

    pub fn entry_price(&self) -> Decimal {
        self.position.entry_price
    }

    pub fn is_win(&self) -> bool {
        self.pnl_pct > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.pnl_pct < Decimal::ZERO
    }
}
