// In crates/execution/src/lib.rs

use async_trait::async_trait;
use core_types::Position;
use rust_decimal::Decimal;

pub mod error;
pub mod manager;
pub mod signal;
pub mod simulated;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use manager::{OpenOutcome, PositionManager, TickOutcome};
pub use signal::SignalExecutor;
pub use simulated::SimulatedExecutor;
pub use types::{Fill, Ledger, OrderRequest};

/// The universal interface for an execution handler.
///
/// An `Executor` carries out an already risk-checked order for one trading
/// mode. The simulated executor fills against the [`Ledger`]; the live-mode
/// executor only emits the intent.
#[async_trait]
pub trait Executor: Send + Sync {
    /// The name of the executor (e.g., "SimulatedExecutor").
    fn name(&self) -> &'static str;

    /// Executes an opening order.
    ///
    /// # Returns
    ///
    /// A `Fill` describing whether a position now exists, or an `Error` if the
    /// order was refused (e.g., insufficient simulated funds).
    async fn open(&mut self, order: &OrderRequest, ledger: &mut Ledger) -> Result<Fill>;

    /// Executes the close of `position` at `price`. Settlement in the ledger
    /// is done by the caller afterwards.
    async fn close(&mut self, position: &Position, price: Decimal, reason: &str) -> Result<()>;
}
