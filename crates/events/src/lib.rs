// In crates/events/src/lib.rs

pub mod command;
pub mod log;
pub mod snapshot;

pub use command::Command;
pub use log::{LogBook, LogEntry, Severity};
pub use snapshot::{ConnectionStatus, EngineSnapshot};

use serde::Serialize;
use std::sync::Arc;

/// The top-level WebSocket message enum.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum WsMessage {
    Snapshot(Arc<EngineSnapshot>),
}
