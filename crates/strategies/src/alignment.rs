// In crates/strategies/src/alignment.rs

use crate::types::StrategySettings;
use crate::{MarketContext, Strategy};
use core_types::{Side, Signal};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Minimum relative gap between the fast and slow averages for an entry.
const MIN_VOLATILITY: Decimal = dec!(0.001);

/// Trend-alignment strategy.
///
/// Enters long when `price > fast > mid > slow` and short on the mirrored
/// stack, provided the fast/slow gap clears the noise filter and the bar is
/// newer than the one the last position was closed on. While in a position it
/// exits on loss of fast/mid alignment, if signal exits are enabled.
#[derive(Debug)]
pub struct Alignment {
    settings: StrategySettings,
}

impl Alignment {
    pub fn new(settings: StrategySettings) -> Self {
        Self { settings }
    }

    fn assess_exit(&self, side: Side, fast: Decimal, mid: Decimal) -> Signal {
        let (f, m) = (self.settings.fast_period, self.settings.mid_period);
        match side {
            Side::Long if fast < mid => Signal::Close {
                reason: format!("Signal Exit ({f} < {m})"),
            },
            Side::Short if fast > mid => Signal::Close {
                reason: format!("Signal Exit ({f} > {m})"),
            },
            _ => Signal::Hold,
        }
    }
}

impl Strategy for Alignment {
    fn name(&self) -> &'static str {
        "Alignment"
    }

    fn assess(&mut self, ctx: &MarketContext<'_>) -> Signal {
        let Some((fast, mid, slow)) = ctx.latest() else {
            return Signal::Hold;
        };

        if let Some(position) = ctx.position {
            if !ctx.signal_exit_enabled {
                return Signal::Hold;
            }
            return self.assess_exit(position.side, fast, mid);
        }

        // One full bar must pass after a close before re-entering.
        if ctx.last_close_bar.is_some_and(|closed| ctx.bar_time <= closed) {
            return Signal::Hold;
        }

        let Some(volatility) = (fast - slow).abs().checked_div(slow) else {
            return Signal::Hold;
        };
        if volatility < MIN_VOLATILITY {
            return Signal::Hold;
        }

        let price = ctx.price;
        let (f, m, s) = (
            self.settings.fast_period,
            self.settings.mid_period,
            self.settings.slow_period,
        );
        let vol_pct = (volatility * dec!(100)).round_dp(2);

        if price > fast && fast > mid && mid > slow {
            Signal::GoLong {
                reason: format!("Aligned: {f}>{m}>{s} (Vol: {vol_pct:.2}%)"),
            }
        } else if price < fast && fast < mid && mid < slow && ctx.shorts_allowed {
            Signal::GoShort {
                reason: format!("Aligned: {f}<{m}<{s} (Vol: {vol_pct:.2}%)"),
            }
        } else {
            Signal::Hold
        }
    }
}
