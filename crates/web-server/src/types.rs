// In crates/web-server/src/types.rs

use serde::{Deserialize, Serialize};

/// Query parameters for the list endpoints (e.g., `?limit=20`).
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// The acknowledgement returned once a command has been applied.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandAccepted {
    pub command: String,
    /// The snapshot version that reflects the command.
    pub version: u64,
}
