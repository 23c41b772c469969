// In crates/events/src/command.rs

use core_types::{BotMode, Interval, MarketType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user command submitted to the engine.
///
/// JSON form: `{"type": "setLeverage", "payload": 10}`. Decimal payloads are
/// strings, e.g. `{"type": "setMargin", "payload": "250"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Command {
    Start,
    Stop,
    SetMode(BotMode),
    SetMarketType(MarketType),
    SetInterval(Interval),
    SetMargin(Decimal),
    SetLeverage(u8),
    SetTakeProfit(Decimal),
    SetStopLoss(Decimal),
    SetTrailing(bool),
    SetSignalExit(bool),
    ManualClose,
    ResetSimulation,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => f.write_str("start"),
            Command::Stop => f.write_str("stop"),
            Command::SetMode(mode) => write!(f, "setMode({mode})"),
            Command::SetMarketType(market) => write!(f, "setMarketType({market})"),
            Command::SetInterval(interval) => write!(f, "setInterval({interval})"),
            Command::SetMargin(margin) => write!(f, "setMargin({margin})"),
            Command::SetLeverage(leverage) => write!(f, "setLeverage({leverage})"),
            Command::SetTakeProfit(tp) => write!(f, "setTakeProfit({tp})"),
            Command::SetStopLoss(sl) => write!(f, "setStopLoss({sl})"),
            Command::SetTrailing(on) => write!(f, "setTrailing({on})"),
            Command::SetSignalExit(on) => write!(f, "setSignalExit({on})"),
            Command::ManualClose => f.write_str("manualClose"),
            Command::ResetSimulation => f.write_str("resetSimulation"),
        }
    }
}
