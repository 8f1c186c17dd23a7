//! Core types and traits for the session breakout system.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, mid-price adjustment)
//! - Session range, trigger levels, positions and closed trades
//! - Order requests and fills
//! - The exchange adapter capability used by the live driver

pub mod types;
pub mod traits;
pub mod error;

pub use error::{BreakoutError, BreakoutResult, DataError, EngineError, ExchangeError};
pub use types::*;
pub use traits::*;
