// In crates/market-data/src/indicators.rs

use crate::MergeOutcome;
use core_types::{Candle, IndicatorPoint};
use rust_decimal::Decimal;

/// Arithmetic mean of the closes in `window`.
///
/// Both the full and the incremental path go through here, summing left to
/// right, so the two produce identical decimals for identical input.
fn window_mean(window: &[Candle]) -> Decimal {
    let sum: Decimal = window.iter().map(|c| c.close).sum();
    sum / Decimal::from(window.len())
}

/// Computes the full N-period simple moving average over `candles`.
///
/// Returns an empty series when there are fewer than `period` candles. Point `i`
/// of the output covers candles `[i, i + period)` and carries the time of the
/// last candle in that window.
pub fn compute_sma(candles: &[Candle], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }

    candles
        .windows(period)
        .map(|window| IndicatorPoint {
            time: window[period - 1].time,
            value: window_mean(window),
        })
        .collect()
}

/// An SMA series kept in step with a [`crate::CandleStore`].
#[derive(Debug, Clone)]
pub struct SmaSeries {
    period: usize,
    points: Vec<IndicatorPoint>,
}

impl SmaSeries {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            points: Vec::new(),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn points(&self) -> &[IndicatorPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&IndicatorPoint> {
        self.points.last()
    }

    /// Discards the series and recomputes it from scratch.
    pub fn rebuild(&mut self, candles: &[Candle]) {
        self.points = compute_sma(candles, self.period);
    }

    /// Brings the series up to date after a single merge, touching only the
    /// points the merge could have changed.
    ///
    /// `candles` is the store's sequence *after* the merge.
    pub fn apply(&mut self, candles: &[Candle], outcome: MergeOutcome) {
        let period = self.period;
        if period == 0 {
            return;
        }

        match outcome {
            MergeOutcome::Rejected { .. } => {}
            MergeOutcome::Inserted => self.rebuild(candles),
            MergeOutcome::Replaced => {
                if candles.len() >= period {
                    let point = IndicatorPoint {
                        time: candles[candles.len() - 1].time,
                        value: window_mean(&candles[candles.len() - period..]),
                    };
                    match self.points.last_mut() {
                        Some(last) => *last = point,
                        None => self.points.push(point),
                    }
                }
            }
            MergeOutcome::Appended { evicted } => {
                let drop = evicted.min(self.points.len());
                self.points.drain(..drop);
                if candles.len() >= period {
                    self.points.push(IndicatorPoint {
                        time: candles[candles.len() - 1].time,
                        value: window_mean(&candles[candles.len() - period..]),
                    });
                }
            }
        }

        debug_assert_eq!(
            self.points.len(),
            (candles.len() + 1).saturating_sub(period),
            "SMA({period}) length out of step with the candle store"
        );
    }
}

/// The three moving averages the strategies read: fast, mid and slow.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub fast: SmaSeries,
    pub mid: SmaSeries,
    pub slow: SmaSeries,
}

impl IndicatorSet {
    pub fn new(fast: usize, mid: usize, slow: usize) -> Self {
        Self {
            fast: SmaSeries::new(fast),
            mid: SmaSeries::new(mid),
            slow: SmaSeries::new(slow),
        }
    }

    pub fn rebuild(&mut self, candles: &[Candle]) {
        self.fast.rebuild(candles);
        self.mid.rebuild(candles);
        self.slow.rebuild(candles);
    }

    pub fn apply(&mut self, candles: &[Candle], outcome: MergeOutcome) {
        self.fast.apply(candles, outcome);
        self.mid.apply(candles, outcome);
        self.slow.apply(candles, outcome);
    }

    /// True when every series has at least `min_points` points.
    pub fn is_ready(&self, min_points: usize) -> bool {
        [&self.fast, &self.mid, &self.slow]
            .iter()
            .all(|s| s.points().len() >= min_points.max(1))
    }
}

impl Default for IndicatorSet {
    fn default() -> Self {
        Self::new(5, 10, 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CandleStore;
    use rust_decimal_macros::dec;

    fn candle(time: i64, close: Decimal) -> Candle {
        Candle {
            time,
            open: close,
            high: close,
            low: close,
            close,
        }
    }

    #[test]
    fn constant_series_averages_to_the_constant() {
        let candles: Vec<Candle> = (0..30).map(|i| candle(i * 60, dec!(42.5))).collect();
        let sma = compute_sma(&candles, 5);
        assert_eq!(sma.len(), 26);
        assert!(sma.iter().all(|p| p.value == dec!(42.5)));
    }

    #[test]
    fn too_short_history_yields_empty_series() {
        let candles: Vec<Candle> = (0..4).map(|i| candle(i * 60, dec!(1))).collect();
        assert!(compute_sma(&candles, 5).is_empty());
    }

    #[test]
    fn windows_align_to_their_last_candle() {
        let candles: Vec<Candle> = (1..=6).map(|i| candle(i * 60, Decimal::from(i))).collect();
        let sma = compute_sma(&candles, 3);

        assert_eq!(sma.len(), candles.len() - 3 + 1);
        assert_eq!(sma[0], IndicatorPoint { time: 180, value: dec!(2) });
        assert_eq!(sma.last().unwrap().time, candles.last().unwrap().time);
        assert_eq!(sma.last().unwrap().value, dec!(5));
    }

    #[test]
    fn incremental_updates_match_full_recompute() {
        let mut store = CandleStore::new(40);
        let mut set = IndicatorSet::new(5, 10, 20);

        // Several ticks per bar, prices with awkward fractions, enough bars to hit the cap.
        let mut price = dec!(20000.13);
        for bar in 0..60i64 {
            for tick in 0..4i64 {
                price += Decimal::new((bar * 7 + tick * 13) % 23 - 11, 2);
                let outcome = store.merge(candle(bar * 60, price));
                set.apply(store.candles(), outcome);

                for series in [&set.fast, &set.mid, &set.slow] {
                    assert_eq!(
                        series.points(),
                        compute_sma(store.candles(), series.period()).as_slice(),
                        "period {} diverged at bar {bar} tick {tick}",
                        series.period()
                    );
                }
            }
        }
        assert_eq!(store.len(), 40);
    }

    #[test]
    fn stale_update_leaves_series_untouched() {
        let mut store = CandleStore::new(100);
        let mut series = SmaSeries::new(2);
        for t in 1..=3 {
            let outcome = store.merge(candle(t * 60, Decimal::from(t)));
            series.apply(store.candles(), outcome);
        }
        let before = series.points().to_vec();

        let outcome = store.merge(candle(60, dec!(100)));
        series.apply(store.candles(), outcome);

        assert_eq!(series.points(), before.as_slice());
    }

    #[test]
    fn readiness_requires_every_series() {
        let candles: Vec<Candle> = (0..20).map(|i| candle(i * 60, dec!(1))).collect();
        let mut set = IndicatorSet::default();
        set.rebuild(&candles[..19]);
        assert!(!set.is_ready(1));
        set.rebuild(&candles);
        assert!(set.is_ready(1));
        assert!(!set.is_ready(2));
    }
}
