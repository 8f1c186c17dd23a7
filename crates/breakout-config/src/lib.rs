//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, BacktestSettings, LiveSettings, LoggingConfig, StrategySettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Load configuration from file and environment.
///
/// Environment variables use the `BREAKOUT` prefix and `__` as the section
/// separator, e.g. `BREAKOUT__LIVE__SYMBOL=ETHUSDT`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("BREAKOUT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[strategy]").unwrap();
        writeln!(file, "session_start = \"02:45\"").unwrap();
        writeln!(file, "session_end = \"03:55\"").unwrap();
        writeln!(file, "tie_break = \"target_first\"").unwrap();
        writeln!(file, "[live]").unwrap();
        writeln!(file, "symbol = \"ETHUSDT\"").unwrap();
        file.flush().unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.strategy.session_start, "02:45");
        assert_eq!(config.strategy.entry_deadline, "18:00");
        assert_eq!(config.live.symbol, "ETHUSDT");
        assert_eq!(config.live.poll_interval_secs, 60);

        let strategy = config.strategy.to_strategy_config().unwrap();
        assert_eq!(
            strategy.tie_break,
            breakout_strategy::TieBreakPolicy::TargetFirst
        );
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_config(Path::new("/no/such/breakout.toml")).is_err());
    }
}
