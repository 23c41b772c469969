// In crates/app-config/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid configuration value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error(transparent)]
    Parameter(#[from] core_types::Error),

    #[error(transparent)]
    Strategy(#[from] strategies::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
