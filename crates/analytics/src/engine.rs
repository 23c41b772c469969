use crate::types::PerformanceReport;
use core_types::{ClosedTrade, Side};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

fn win_rate<'a>(trades: impl Iterator<Item = &'a ClosedTrade>) -> (u32, f64) {
    let (total, wins) = trades.fold((0u32, 0u32), |(total, wins), t| {
        (total + 1, wins + u32::from(t.pnl > dec!(0)))
    });
    if total == 0 {
        (0, 0.0)
    } else {
        (total, wins as f64 / total as f64 * 100.0)
    }
}

/// The engine responsible for calculating performance metrics from trade data.
///
/// Stateless: every report is derived from the history it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Calculates a performance report from the closed-trade history.
    pub fn calculate(&self, trades: &[ClosedTrade]) -> PerformanceReport {
        let mut report = PerformanceReport::new();
        if trades.is_empty() {
            return report;
        }

        report.total_trades = trades.len() as u32;
        (report.longs, report.long_win_rate) =
            win_rate(trades.iter().filter(|t| t.side() == Side::Long));
        (report.shorts, report.short_win_rate) =
            win_rate(trades.iter().filter(|t| t.side() == Side::Short));
        (_, report.win_rate) = win_rate(trades.iter());

        report.total_pnl = trades.iter().map(|t| t.pnl).sum();
        report.gross_profit = trades
            .iter()
            .filter(|t| t.pnl > dec!(0))
            .map(|t| t.pnl)
            .sum();
        report.gross_loss = trades
            .iter()
            .filter(|t| t.pnl < dec!(0))
            .map(|t| t.pnl)
            .sum::<Decimal>()
            .abs();

        report.profit_factor = if report.gross_loss > dec!(0) {
            (report.gross_profit / report.gross_loss)
                .to_f64()
                .unwrap_or(0.0)
        } else {
            report.gross_profit.to_f64().unwrap_or(0.0)
        };

        report.expectancy = report.total_pnl / Decimal::from(trades.len());

        let total_duration_secs: i64 = trades
            .iter()
            .map(|t| (t.closed_at - t.position.opened_at).num_seconds())
            .sum();
        report.avg_trade_duration_secs = total_duration_secs as f64 / trades.len() as f64;

        report
    }
}
