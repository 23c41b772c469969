// In crates/strategies/src/lib.rs

use core_types::{IndicatorPoint, Position, Signal};
use rust_decimal::Decimal;

pub mod alignment;
pub mod crossover;
pub mod error;
pub mod factory;
pub mod types;

pub use alignment::Alignment;
pub use crossover::Crossover;
pub use error::{Error, Result};
pub use factory::create_strategy;
pub use types::{StrategySettings, StrategyVariant};

/// Everything a strategy may look at for a single evaluation.
///
/// Built fresh by the engine for every change of the candle store.
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    /// Open time of the bar the current price belongs to.
    pub bar_time: i64,
    /// Close of the forming bar.
    pub price: Decimal,
    pub fast: &'a [IndicatorPoint],
    pub mid: &'a [IndicatorPoint],
    pub slow: &'a [IndicatorPoint],
    pub position: Option<&'a Position>,
    /// Bar time at which the previous position was closed, if any.
    pub last_close_bar: Option<i64>,
    pub shorts_allowed: bool,
    pub signal_exit_enabled: bool,
}

impl MarketContext<'_> {
    /// The latest value of each series, or `None` if any is empty.
    pub fn latest(&self) -> Option<(Decimal, Decimal, Decimal)> {
        Some((
            self.fast.last()?.value,
            self.mid.last()?.value,
            self.slow.last()?.value,
        ))
    }
}

/// The universal interface for a trading strategy.
///
/// A strategy turns the current price and moving averages into a `Signal`.
/// It only expresses intent; balance checks and the single-position rule are
/// enforced downstream.
pub trait Strategy: Send + Sync {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    fn assess(&mut self, ctx: &MarketContext<'_>) -> Signal;
}
