// In crates/strategies/src/crossover.rs

use crate::types::StrategySettings;
use crate::{MarketContext, Strategy};
use core_types::{IndicatorPoint, Side, Signal};
use rust_decimal::Decimal;

/// Direction of a fast/mid cross between the previous and current points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cross {
    Bullish,
    Bearish,
}

fn last_two(series: &[IndicatorPoint]) -> Option<(Decimal, Decimal)> {
    match series {
        [.., prev, cur] => Some((prev.value, cur.value)),
        _ => None,
    }
}

/// Fast/mid moving-average crossover with a slow-average trend filter.
///
/// Needs at least two points per series. Exits on the opposite cross
/// regardless of the signal-exit toggle.
#[derive(Debug)]
pub struct Crossover {
    settings: StrategySettings,
}

impl Crossover {
    pub fn new(settings: StrategySettings) -> Self {
        Self { settings }
    }

    fn detect(fast: (Decimal, Decimal), mid: (Decimal, Decimal)) -> Option<Cross> {
        let (last_fast, cur_fast) = fast;
        let (last_mid, cur_mid) = mid;

        if cur_fast > cur_mid && last_fast <= last_mid {
            Some(Cross::Bullish)
        } else if cur_fast < cur_mid && last_fast >= last_mid {
            Some(Cross::Bearish)
        } else {
            None
        }
    }
}

impl Strategy for Crossover {
    fn name(&self) -> &'static str {
        "Crossover"
    }

    fn assess(&mut self, ctx: &MarketContext<'_>) -> Signal {
        let (Some(fast), Some(mid), Some((_, slow))) =
            (last_two(ctx.fast), last_two(ctx.mid), last_two(ctx.slow))
        else {
            return Signal::Hold;
        };

        let Some(cross) = Self::detect(fast, mid) else {
            return Signal::Hold;
        };
        let (f, m, s) = (
            self.settings.fast_period,
            self.settings.mid_period,
            self.settings.slow_period,
        );

        match (ctx.position.map(|p| p.side), cross) {
            (Some(Side::Long), Cross::Bearish) => Signal::Close {
                reason: format!("Crossover Exit ({f} < {m})"),
            },
            (Some(Side::Short), Cross::Bullish) => Signal::Close {
                reason: format!("Crossover Exit ({f} > {m})"),
            },
            (Some(_), _) => Signal::Hold,
            (None, Cross::Bullish) if ctx.price > slow => Signal::GoLong {
                reason: format!("Crossover: {f} over {m}, price > {s}"),
            },
            (None, Cross::Bearish) if ctx.price < slow && ctx.shorts_allowed => Signal::GoShort {
                reason: format!("Crossover: {f} under {m}, price < {s}"),
            },
            (None, _) => Signal::Hold,
        }
    }
}
