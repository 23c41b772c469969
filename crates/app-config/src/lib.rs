// In crates/app-config/src/lib.rs

use config::{Config, Environment, File, FileFormat};
use std::path::Path;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, BinanceSettings, BotSettings, MarketSettings, ServerSettings, Settings};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings() -> Result<Settings> {
    load_settings_from(Path::new("config"))
}

/// Same as [`load_settings`] with an explicit configuration directory.
pub fn load_settings_from(config_dir: &Path) -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        // 1. Load the base configuration file.
        .add_source(File::with_name(&config_dir.join("base").to_string_lossy()))
        // 2. Load the environment-specific configuration file.
        .add_source(
            File::with_name(&config_dir.join(&environment).to_string_lossy()).required(false),
        )
        // 3. Load settings from environment variables (e.g., `APP__BOT__LEVERAGE=5`).
        // The prefix is `APP`, separator is `__`.
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}

/// Parses settings from a TOML string without touching files or the environment.
pub fn parse_settings(toml: &str) -> Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{BotMode, Interval, MarketType};
    use rust_decimal_macros::dec;
    use strategies::StrategyVariant;

    const BASE: &str = include_str!("../../../config/base.toml");

    #[test]
    fn base_file_parses_and_validates() {
        let settings = parse_settings(BASE).unwrap();
        let params = settings.bot_parameters().unwrap();

        assert_eq!(params.mode, BotMode::Simulated);
        assert_eq!(params.market_type, MarketType::Futures);
        assert_eq!(params.interval, Interval::OneMinute);
        assert_eq!(params.margin_amount, dec!(100));
        assert_eq!(params.take_profit_percent, dec!(0.5));
        assert_eq!(params.stop_loss_percent, dec!(0.3));
        assert_eq!(settings.bot.initial_balance().unwrap(), dec!(10000));
        assert_eq!(settings.market.max_candles, 1500);
        assert_eq!(settings.strategy.variant, StrategyVariant::Alignment);
        assert_eq!(settings.market.symbol().0, "BTCUSDT");
    }

    #[test]
    fn leverage_out_of_range_is_rejected() {
        let toml = BASE.replace("leverage = 1", "leverage = 126");
        assert!(matches!(parse_settings(&toml), Err(Error::Parameter(_))));
    }

    #[test]
    fn unknown_interval_is_rejected() {
        let toml = BASE.replace("interval = \"1m\"", "interval = \"4h\"");
        assert!(parse_settings(&toml).is_err());
    }

    #[test]
    fn crossover_variant_can_be_selected() {
        let toml = BASE.replace("variant = \"alignment\"", "variant = \"crossover\"");
        let settings = parse_settings(&toml).unwrap();
        assert_eq!(settings.strategy.variant, StrategyVariant::Crossover);
    }

    #[test]
    fn non_positive_margin_is_rejected() {
        let toml = BASE.replace("margin_amount = 100.0", "margin_amount = 0.0");
        assert!(parse_settings(&toml).is_err());
    }
}
