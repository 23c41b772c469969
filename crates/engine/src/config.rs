// In crates/engine/src/config.rs

use app_config::Settings;
use core_types::{BotParameters, Symbol};
use events::log::offset_from_hours;
use rust_decimal::Decimal;
use std::time::Duration;
use strategies::StrategySettings;

/// Everything the engine needs at construction, resolved from [`Settings`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub symbol: Symbol,
    pub parameters: BotParameters,
    pub strategy: StrategySettings,
    pub initial_balance: Decimal,
    pub auto_start: bool,
    pub max_candles: usize,
    pub history_limit: u16,
    pub reconnect_delay: Duration,
    pub max_log_entries: usize,
    pub max_trade_history: usize,
    pub log_offset: chrono::FixedOffset,
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> app_config::Result<Self> {
        let log_offset = offset_from_hours(settings.bot.timezone_offset_hours).ok_or_else(|| {
            app_config::Error::InvalidValue {
                key: "bot.timezone_offset_hours",
                reason: format!("{} is not a valid offset", settings.bot.timezone_offset_hours),
            }
        })?;

        Ok(Self {
            symbol: settings.market.symbol(),
            parameters: settings.bot_parameters()?,
            strategy: settings.strategy.clone(),
            initial_balance: settings.bot.initial_balance()?,
            auto_start: settings.bot.auto_start,
            max_candles: settings.market.max_candles,
            history_limit: settings.market.history_limit,
            reconnect_delay: Duration::from_secs(settings.market.reconnect_delay_secs),
            max_log_entries: settings.bot.max_log_entries,
            max_trade_history: settings.bot.max_trade_history,
            log_offset,
        })
    }
}
