// In crates/app-config/src/types.rs

use crate::{Error, Result};
use core_types::{BotMode, BotParameters, Interval, MarketType, Symbol};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use strategies::StrategySettings;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the Binance market-data endpoints.
    pub binance: BinanceSettings,
    /// Which market to follow and how to keep the feed alive.
    pub market: MarketSettings,
    /// Trading parameters and simulated account.
    pub bot: BotSettings,
    #[serde(default)]
    pub strategy: StrategySettings,
    pub server: ServerSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BinanceSettings {
    /// The REST API base URL for Binance Futures.
    pub rest_base_url: String,
    /// The WebSocket base URL for Binance Futures raw streams.
    pub ws_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MarketSettings {
    pub symbol: String,
    pub interval: Interval,
    #[serde(default = "default_history_limit")]
    pub history_limit: u16,
    #[serde(default = "default_max_candles")]
    pub max_candles: usize,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BotSettings {
    pub mode: BotMode,
    pub market_type: MarketType,
    pub margin_amount: f64,
    pub leverage: u8,
    pub take_profit_percent: f64,
    pub stop_loss_percent: f64,
    #[serde(default)]
    pub trailing_stop_enabled: bool,
    #[serde(default)]
    pub signal_exit_enabled: bool,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: f64,
    #[serde(default = "default_timezone_offset_hours")]
    pub timezone_offset_hours: i32,
    /// Start evaluating the strategy as soon as the engine runs.
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,
    #[serde(default = "default_max_trade_history")]
    pub max_trade_history: usize,
}

/// Helper functions for serde defaults
fn default_timeout_secs() -> u64 { 10 }
fn default_history_limit() -> u16 { 1000 }
fn default_max_candles() -> usize { 1500 }
fn default_reconnect_delay_secs() -> u64 { 3 }
fn default_initial_balance() -> f64 { 10_000.0 }
fn default_timezone_offset_hours() -> i32 { -3 }
fn default_max_log_entries() -> usize { 50 }
fn default_max_trade_history() -> usize { 500 }

fn to_decimal(key: &'static str, value: f64) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| Error::InvalidValue {
        key,
        reason: format!("{value} is not a finite decimal"),
    })
}

impl MarketSettings {
    pub fn symbol(&self) -> Symbol {
        Symbol(self.symbol.trim().to_ascii_uppercase())
    }
}

impl BotSettings {
    pub fn initial_balance(&self) -> Result<Decimal> {
        to_decimal("bot.initial_balance", self.initial_balance)
    }
}

impl Settings {
    /// The trading parameters the engine starts with.
    pub fn bot_parameters(&self) -> Result<BotParameters> {
        let bot = &self.bot;
        let params = BotParameters {
            mode: bot.mode,
            market_type: bot.market_type,
            interval: self.market.interval,
            margin_amount: to_decimal("bot.margin_amount", bot.margin_amount)?,
            leverage: bot.leverage,
            take_profit_percent: to_decimal("bot.take_profit_percent", bot.take_profit_percent)?,
            stop_loss_percent: to_decimal("bot.stop_loss_percent", bot.stop_loss_percent)?,
            trailing_stop_enabled: bot.trailing_stop_enabled,
            signal_exit_enabled: bot.signal_exit_enabled,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks every cross-field rule. `load_settings` calls this before returning.
    pub fn validate(&self) -> Result<()> {
        self.bot_parameters()?;
        strategies::create_strategy(&self.strategy)?;

        if self.market.symbol.trim().is_empty() {
            return Err(Error::InvalidValue {
                key: "market.symbol",
                reason: "must not be empty".to_string(),
            });
        }
        if self.market.history_limit == 0 || self.market.history_limit > 1500 {
            return Err(Error::InvalidValue {
                key: "market.history_limit",
                reason: format!("{} is outside 1..=1500", self.market.history_limit),
            });
        }
        if self.market.max_candles < self.strategy.slow_period {
            return Err(Error::InvalidValue {
                key: "market.max_candles",
                reason: format!(
                    "{} cannot hold a {}-period average",
                    self.market.max_candles, self.strategy.slow_period
                ),
            });
        }
        if self.bot.initial_balance()? <= Decimal::ZERO {
            return Err(Error::InvalidValue {
                key: "bot.initial_balance",
                reason: "must be positive".to_string(),
            });
        }
        if !(-12..=14).contains(&self.bot.timezone_offset_hours) {
            return Err(Error::InvalidValue {
                key: "bot.timezone_offset_hours",
                reason: format!("{} is outside -12..=14", self.bot.timezone_offset_hours),
            });
        }
        Ok(())
    }
}
