// In crates/strategies/src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which entry/exit rule set drives the bot for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyVariant {
    /// Price and all three averages stacked in one direction.
    #[default]
    Alignment,
    /// A fresh cross of the fast average over the mid average.
    Crossover,
}

impl fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyVariant::Alignment => f.write_str("alignment"),
            StrategyVariant::Crossover => f.write_str("crossover"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StrategySettings {
    #[serde(default)]
    pub variant: StrategyVariant,
    #[serde(default = "default_fast_period")]
    pub fast_period: usize,
    #[serde(default = "default_mid_period")]
    pub mid_period: usize,
    #[serde(default = "default_slow_period")]
    pub slow_period: usize,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            variant: StrategyVariant::default(),
            fast_period: default_fast_period(),
            mid_period: default_mid_period(),
            slow_period: default_slow_period(),
        }
    }
}

fn default_fast_period() -> usize {
    5
}
fn default_mid_period() -> usize {
    10
}
fn default_slow_period() -> usize {
    20
}
