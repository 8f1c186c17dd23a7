//! Error types for the breakout system.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum BreakoutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BreakoutError {
    /// Whether the live driver may skip the tick and retry.
    pub fn is_transient(&self) -> bool {
        match self {
            BreakoutError::Exchange(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Strategy engine errors.
///
/// Every variant except `InvalidConfig` is an input-contract violation and
/// ends the current run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Bars out of order: {current} does not follow {previous}")]
    OutOfOrder {
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("Malformed bar at {timestamp}: {reason}")]
    MalformedBar {
        timestamp: NaiveDateTime,
        reason: String,
    },

    #[error("Session range for {date} is not finalized")]
    RangeNotFinalized { date: NaiveDate },

    #[error("Invalid strategy configuration: {0}")]
    InvalidConfig(String),
}

/// Exchange adapter errors.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("No price available for {0}")]
    NoPrice(String),
}

impl ExchangeError {
    /// Network hiccups and server-side failures are worth retrying;
    /// bad credentials and rejected orders are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ExchangeError::Connection(_)
            | ExchangeError::InvalidResponse(_)
            | ExchangeError::NoPrice(_) => true,
            ExchangeError::Api { status, .. } => *status == 429 || *status >= 500,
            ExchangeError::Configuration(_) | ExchangeError::OrderRejected(_) => false,
        }
    }
}

/// Data ingestion errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Duplicate bar at {0}")]
    Duplicate(NaiveDateTime),
}

/// Result type alias.
pub type BreakoutResult<T> = Result<T, BreakoutError>;
