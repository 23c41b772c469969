// In crates/core-types/src/types.rs

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trading pair symbol as understood by the upstream venue (e.g., "BTCUSDT").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.write_str("LONG"),
            Side::Short => f.write_str("SHORT"),
        }
    }
}

/// One OHLC bar. `time` is the bar's open time in Unix seconds and identifies the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// An incremental bar update from the live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarUpdate {
    pub candle: Candle,
    /// True when the venue reports this as the final update for the bar.
    pub is_closed: bool,
}

/// One output point of a moving-average series, aligned to the candle it ends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub time: i64,
    pub value: Decimal,
}

/// The bar durations the bot can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
}

impl Interval {
    pub const ALL: [Interval; 3] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
    ];

    /// The venue's string code for this interval (e.g., "5m").
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == s.trim())
            .ok_or_else(|| Error::InvalidInterval(s.to_string()))
    }
}

impl TryFrom<String> for Interval {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.as_str().to_string()
    }
}

/// Where orders go. Only `Simulated` keeps a local ledger; the live modes emit intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BotMode {
    Simulated,
    LiveA,
    LiveB,
}

impl BotMode {
    pub fn is_simulated(&self) -> bool {
        matches!(self, BotMode::Simulated)
    }
}

impl fmt::Display for BotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotMode::Simulated => f.write_str("SIMULATED"),
            BotMode::LiveA => f.write_str("LIVE_A"),
            BotMode::LiveB => f.write_str("LIVE_B"),
        }
    }
}

impl FromStr for BotMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIMULATED" | "SIM" => Ok(BotMode::Simulated),
            "LIVE_A" => Ok(BotMode::LiveA),
            "LIVE_B" => Ok(BotMode::LiveB),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketType {
    Spot,
    Futures,
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketType::Spot => f.write_str("SPOT"),
            MarketType::Futures => f.write_str("FUTURES"),
        }
    }
}

impl FromStr for MarketType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SPOT" => Ok(MarketType::Spot),
            "FUTURES" => Ok(MarketType::Futures),
            _ => Err(Error::InvalidMarketType(s.to_string())),
        }
    }
}

/// The single active position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub side: Side,
    pub entry_price: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    /// Capital committed before leverage.
    pub margin_amount: Decimal,
    pub leverage: u8,
    pub opened_at: DateTime<Utc>,
    pub trigger_reason: String,
    /// Set once the stop has been moved to break-even.
    pub trailing_active: bool,
}

/// A position snapshot plus its realized outcome. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTrade {
    #[serde(flatten)]
    pub position: Position,
    pub exit_price: Decimal,
    pub closed_at: DateTime<Utc>,
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
    pub close_reason: String,
    pub mode: BotMode,
}

impl ClosedTrade {
    pub fn side(&self) -> Side {
        self.position.side
    }
}

/// The user-adjustable trading parameters in effect at any moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotParameters {
    pub mode: BotMode,
    pub market_type: MarketType,
    pub interval: Interval,
    pub margin_amount: Decimal,
    pub leverage: u8,
    pub take_profit_percent: Decimal,
    pub stop_loss_percent: Decimal,
    pub trailing_stop_enabled: bool,
    pub signal_exit_enabled: bool,
}

impl BotParameters {
    pub const MAX_LEVERAGE: u8 = 125;

    pub fn validate(&self) -> Result<()> {
        validate_margin(self.margin_amount)?;
        validate_leverage(self.leverage)?;
        validate_percent("takeProfitPercent", self.take_profit_percent)?;
        validate_percent("stopLossPercent", self.stop_loss_percent)
    }

    /// Shorts are only taken in simulation or on a futures market.
    pub fn shorts_allowed(&self) -> bool {
        self.mode.is_simulated() || self.market_type == MarketType::Futures
    }
}

pub fn validate_margin(margin: Decimal) -> Result<()> {
    if margin <= Decimal::ZERO {
        return Err(Error::InvalidParameter(format!(
            "marginAmount must be positive, got {margin}"
        )));
    }
    Ok(())
}

pub fn validate_leverage(leverage: u8) -> Result<()> {
    if !(1..=BotParameters::MAX_LEVERAGE).contains(&leverage) {
        return Err(Error::InvalidParameter(format!(
            "leverage must be within 1..={}, got {leverage}",
            BotParameters::MAX_LEVERAGE
        )));
    }
    Ok(())
}

pub fn validate_percent(name: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(Error::InvalidParameter(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(())
}

/// The output of a strategy assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Hold,
    GoLong { reason: String },
    GoShort { reason: String },
    Close { reason: String },
}
