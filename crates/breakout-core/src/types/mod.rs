//! Core data types for the breakout system.

mod bar;
mod order;
mod position;
mod session;

pub use bar::{Bar, MidPriceAdjustment};
pub use order::{Fill, OrderRequest, OrderSide};
pub use position::{ExitReason, Position, Side, Trade};
pub use session::{SessionRange, TriggerLevels};
