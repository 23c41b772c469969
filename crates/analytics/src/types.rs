// In crates/analytics/src/types.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Roll-up statistics over the closed-trade history.
///
/// Rates are percentages in `[0, 100]`. Every field is zero for an empty history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub total_trades: u32,
    pub longs: u32,
    pub shorts: u32,
    pub win_rate: f64,
    pub long_win_rate: f64,
    pub short_win_rate: f64,
    /// Gross profit over gross loss; equals gross profit when nothing was lost.
    pub profit_factor: f64,
    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    /// Average P&L per trade.
    pub expectancy: Decimal,
    pub avg_trade_duration_secs: f64,
}

impl PerformanceReport {
    /// Creates a new, empty report.
    pub fn new() -> Self {
        Self::default()
    }
}
