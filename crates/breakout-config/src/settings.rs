//! Configuration structures.

use breakout_core::{BreakoutError, BreakoutResult};
use breakout_strategy::{CostModel, DualTriggerPolicy, StrategyConfig, TieBreakPolicy};
use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub strategy: StrategySettings,
    #[serde(default)]
    pub backtest: BacktestSettings,
    #[serde(default)]
    pub live: LiveSettings,
}

impl AppConfig {
    /// Check every section that can be checked without I/O.
    pub fn validate(&self) -> BreakoutResult<()> {
        self.strategy.to_strategy_config()?;
        self.live.validate()?;
        if self.backtest.starting_equity <= Decimal::ZERO {
            return Err(BreakoutError::Config(
                "backtest.starting_equity must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> BreakoutResult<String> {
        toml::to_string_pretty(self).map_err(|e| BreakoutError::Serialization(e.to_string()))
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "session-breakout".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Optional log file, rotated daily
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Strategy parameters as written in the config file.
///
/// Times are `"HH:MM"` in the reference time zone; percentages are in
/// percent units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub session_start: String,
    pub session_end: String,
    pub entry_deadline: String,
    pub exit_deadline: String,
    pub buffer_pct: Decimal,
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    pub trail_activate_pct: Decimal,
    pub trail_lock_pct: Decimal,
    pub fee_pct: Decimal,
    pub spread_pct: Decimal,
    pub point_cost: Decimal,
    pub point_multiplier: Decimal,
    pub tie_break: TieBreakPolicy,
    pub dual_trigger: DualTriggerPolicy,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            session_start: "08:15".to_string(),
            session_end: "09:15".to_string(),
            entry_deadline: "18:00".to_string(),
            exit_deadline: "19:10".to_string(),
            buffer_pct: dec!(0.05),
            stop_loss_pct: dec!(0.30),
            take_profit_pct: dec!(0.70),
            trail_activate_pct: dec!(0.40),
            trail_lock_pct: dec!(0.20),
            fee_pct: dec!(0.06),
            spread_pct: dec!(0.02),
            point_cost: Decimal::ZERO,
            point_multiplier: dec!(0.01),
            tie_break: TieBreakPolicy::default(),
            dual_trigger: DualTriggerPolicy::default(),
        }
    }
}

fn parse_time(field: &str, value: &str) -> BreakoutResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| BreakoutError::Config(format!("{field}: invalid time '{value}'")))
}

impl StrategySettings {
    /// Build and validate the engine configuration.
    pub fn to_strategy_config(&self) -> BreakoutResult<StrategyConfig> {
        let config = StrategyConfig {
            session_start: parse_time("session_start", &self.session_start)?,
            session_end: parse_time("session_end", &self.session_end)?,
            entry_deadline: parse_time("entry_deadline", &self.entry_deadline)?,
            exit_deadline: parse_time("exit_deadline", &self.exit_deadline)?,
            buffer_pct: self.buffer_pct,
            stop_loss_pct: self.stop_loss_pct,
            take_profit_pct: self.take_profit_pct,
            trail_activate_pct: self.trail_activate_pct,
            trail_lock_pct: self.trail_lock_pct,
            costs: CostModel::new(self.fee_pct, self.spread_pct, self.point_cost),
            point_multiplier: self.point_multiplier,
            tie_break: self.tie_break,
            dual_trigger: self.dual_trigger,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Backtest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub starting_equity: Decimal,
    /// `generic` or `mt5`
    pub data_format: String,
    /// Minutes added to data timestamps
    pub shift_minutes: i64,
    pub symbol: String,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            starting_equity: dec!(100),
            data_format: "generic".to_string(),
            shift_minutes: 0,
            symbol: "BTCUSD".to_string(),
        }
    }
}

/// Live trading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveSettings {
    pub symbol: String,
    pub quantity: Decimal,
    pub poll_interval_secs: u64,
    /// First back-off after a failed fetch
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    /// IANA name of the reference time zone
    pub timezone: String,
    pub base_url: String,
    pub api_key_env: String,
    pub api_secret_env: String,
    /// Paper fills move against the trader by this percentage
    pub paper_slippage_pct: Decimal,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            quantity: dec!(0.001),
            poll_interval_secs: 60,
            initial_backoff_secs: 10,
            max_backoff_secs: 300,
            timezone: "Asia/Kolkata".to_string(),
            base_url: "https://api.binance.com".to_string(),
            api_key_env: "BINANCE_API_KEY".to_string(),
            api_secret_env: "BINANCE_SECRET".to_string(),
            paper_slippage_pct: Decimal::ZERO,
        }
    }
}

impl LiveSettings {
    pub fn validate(&self) -> BreakoutResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(BreakoutError::Config("live.symbol is empty".into()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(BreakoutError::Config("live.quantity must be positive".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(BreakoutError::Config(
                "live.poll_interval_secs must be positive".into(),
            ));
        }
        if self.initial_backoff_secs == 0 || self.max_backoff_secs < self.initial_backoff_secs {
            return Err(BreakoutError::Config(
                "live back-off must satisfy 0 < initial_backoff_secs <= max_backoff_secs".into(),
            ));
        }
        if self.paper_slippage_pct < Decimal::ZERO {
            return Err(BreakoutError::Config(
                "live.paper_slippage_pct must not be negative".into(),
            ));
        }
        Ok(())
    }
}
