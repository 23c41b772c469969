// In crates/strategies/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid SMA periods {fast}/{mid}/{slow}: expected 0 < fast < mid < slow")]
    InvalidPeriods { fast: usize, mid: usize, slow: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
