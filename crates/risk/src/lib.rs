// In crates/risk/src/lib.rs

use core_types::{Position, Side};
use rust_decimal::Decimal;

pub mod bracket_manager;
pub mod error;
pub mod types;

// Re-export public types
pub use bracket_manager::BracketRiskManager;
pub use error::{Error, Result};
pub use types::{Bracket, ExitTrigger, RiskSettings};

/// The universal interface for a risk management module.
///
/// A `RiskManager` owns the price levels around a position: where it is placed
/// on entry, when it must be exited, and how its stop may be moved while open.
/// It never mutates a position itself; callers apply what it returns.
pub trait RiskManager: Send + Sync {
    /// The name of the risk management strategy.
    fn name(&self) -> &'static str;

    fn settings(&self) -> &RiskSettings;

    /// Replaces the settings used for future decisions. Open positions keep
    /// the bracket they were opened with.
    fn update_settings(&mut self, settings: RiskSettings) -> Result<()>;

    /// Computes the take-profit and stop-loss for an entry at `entry_price`.
    fn bracket(&self, side: Side, entry_price: Decimal) -> Bracket;

    /// Checks the price against the position's bracket.
    ///
    /// When both legs are satisfied at once (only possible with a
    /// misconfigured bracket) take-profit wins.
    fn check_exit(&self, position: &Position, price: Decimal) -> Option<ExitTrigger>;

    /// Returns the new stop-loss if the price has moved far enough in favour
    /// of the position to lock in break-even. Returns `None` once trailing is
    /// already active or when it is disabled.
    fn trailing_stop(&self, position: &Position, price: Decimal) -> Option<Decimal>;
}
