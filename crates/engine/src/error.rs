// In crates/engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    InvalidParameter(#[from] core_types::Error),

    #[error(transparent)]
    Execution(#[from] execution::Error),

    #[error(transparent)]
    Risk(#[from] risk::Error),

    #[error(transparent)]
    Strategy(#[from] strategies::Error),

    #[error("No market data received yet")]
    NoMarketData,

    #[error("Engine is not running")]
    EngineStopped,
}

pub type Result<T> = std::result::Result<T, Error>;
