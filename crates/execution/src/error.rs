// In crates/execution/src/error.rs

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Insufficient funds: balance {balance} is below margin {required}")]
    InsufficientFunds { balance: Decimal, required: Decimal },

    /// Opening on top of an existing position is a logic fault, never an overwrite.
    #[error("Position {id} is already open")]
    PositionAlreadyOpen { id: String },

    #[error("Invalid price {0}: prices must be positive")]
    InvalidPrice(Decimal),

    #[error("No open position")]
    NoOpenPosition,

    #[error("Execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Risk error: {0}")]
    Risk(#[from] risk::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
