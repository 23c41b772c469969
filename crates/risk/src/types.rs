// In crates/risk/src/types.rs

use crate::{Error, Result};
use core_types::BotParameters;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bracket settings, expressed in percent of the entry price (0.5 means 0.5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSettings {
    pub take_profit_percent: Decimal,
    pub stop_loss_percent: Decimal,
    pub trailing_stop_enabled: bool,
}

impl RiskSettings {
    pub fn validate(&self) -> Result<()> {
        if self.take_profit_percent <= Decimal::ZERO {
            return Err(Error::InvalidParameters(format!(
                "take_profit_percent must be positive, got {}",
                self.take_profit_percent
            )));
        }
        if self.stop_loss_percent <= Decimal::ZERO {
            return Err(Error::InvalidParameters(format!(
                "stop_loss_percent must be positive, got {}",
                self.stop_loss_percent
            )));
        }
        Ok(())
    }
}

impl From<&BotParameters> for RiskSettings {
    fn from(params: &BotParameters) -> Self {
        Self {
            take_profit_percent: params.take_profit_percent,
            stop_loss_percent: params.stop_loss_percent,
            trailing_stop_enabled: params.trailing_stop_enabled,
        }
    }
}

/// Take-profit and stop-loss prices for a new position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
}

/// Which bracket leg a price touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTrigger {
    TakeProfit,
    StopLoss,
}

impl ExitTrigger {
    /// The close reason recorded on the trade.
    pub fn reason(&self) -> &'static str {
        match self {
            ExitTrigger::TakeProfit => "Take Profit",
            ExitTrigger::StopLoss => "Stop Loss",
        }
    }
}

impl fmt::Display for ExitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}
