// In crates/events/src/snapshot.rs

use crate::LogEntry;
use analytics::PerformanceReport;
use core_types::{BotParameters, Candle, ClosedTrade, IndicatorPoint, Position, Symbol};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Normalized state of the market feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    LoadingHistory,
    Live,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => f.write_str("DISCONNECTED"),
            ConnectionStatus::LoadingHistory => f.write_str("LOADING_HISTORY"),
            ConnectionStatus::Live => f.write_str("LIVE"),
        }
    }
}

/// The three moving averages, by role.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SmaSnapshot {
    pub fast: Vec<IndicatorPoint>,
    pub mid: Vec<IndicatorPoint>,
    pub slow: Vec<IndicatorPoint>,
}

/// Everything a reader may observe, published atomically by the engine.
///
/// `version` strictly increases with every published snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub version: u64,
    pub symbol: Symbol,
    pub strategy: String,
    pub status: ConnectionStatus,
    pub is_active: bool,
    pub parameters: BotParameters,
    pub balance: Decimal,
    pub candles: Vec<Candle>,
    pub sma: SmaSnapshot,
    pub position: Option<Position>,
    /// Newest first.
    pub history: Vec<ClosedTrade>,
    pub metrics: PerformanceReport,
    /// Newest first.
    pub logs: Vec<LogEntry>,
}
