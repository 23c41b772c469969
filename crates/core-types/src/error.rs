// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unsupported interval '{0}', expected one of 1m, 5m, 15m")]
    InvalidInterval(String),

    #[error("Unknown bot mode '{0}'")]
    InvalidMode(String),

    #[error("Unknown market type '{0}'")]
    InvalidMarketType(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
