//! The price-truth side of the bot: an ordered candle store and the moving
//! averages derived from it.

pub mod candle_store;
pub mod indicators;

pub use candle_store::{CandleStore, MergeOutcome};
pub use indicators::{IndicatorSet, SmaSeries, compute_sma};
