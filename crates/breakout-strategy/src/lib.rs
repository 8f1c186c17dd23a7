//! Session-range breakout strategy.
//!
//! This crate provides the strategy core:
//! - Session range tracking and breakout trigger levels
//! - The position state machine (entries, stops, targets, trailing, time exit)
//! - The `StrategyEngine` used by both the replay and live drivers
//! - The trade ledger and its statistics

mod config;
mod costs;
mod engine;
mod exits;
mod ledger;
mod machine;
mod session;
mod trigger;

pub use config::{DualTriggerPolicy, StrategyConfig, TieBreakPolicy};
pub use costs::CostModel;
pub use engine::{EngineSnapshot, StrategyEngine};
pub use exits::ExitRules;
pub use ledger::{LedgerStats, TradeLedger};
pub use machine::{PositionState, PositionStateMachine};
pub use session::{SessionEvent, SessionTracker};
pub use trigger::TriggerCalculator;
