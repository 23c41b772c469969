// In crates/market-data/src/candle_store.rs

use core_types::Candle;

/// What a call to [`CandleStore::merge`] did to the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The store was empty and now holds exactly this bar.
    Inserted,
    /// The update carried the forming bar's time and replaced it in place.
    Replaced,
    /// A strictly newer bar was appended. `evicted` oldest bars were dropped to honour the cap.
    Appended { evicted: usize },
    /// The update was older than the last bar and was dropped.
    Rejected { last_time: i64 },
}

impl MergeOutcome {
    /// True when the sequence changed and downstream consumers must re-evaluate.
    pub fn changed(&self) -> bool {
        !matches!(self, MergeOutcome::Rejected { .. })
    }
}

/// An ordered sequence of OHLC bars for one symbol and interval.
///
/// Bars are strictly increasing by `time`. Only the last bar (the forming bar)
/// can change; it is sealed as soon as a bar with a greater `time` arrives.
#[derive(Debug, Clone)]
pub struct CandleStore {
    candles: Vec<Candle>,
    max_len: usize,
}

impl CandleStore {
    /// Creates an empty store keeping at most `max_len` bars (at least one).
    pub fn new(max_len: usize) -> Self {
        Self {
            candles: Vec::new(),
            max_len: max_len.max(1),
        }
    }

    /// Replaces the sequence with fetched history.
    ///
    /// Rows that would break ordering are skipped; a duplicated time keeps the
    /// later row. Live bars already merged at or after the last history bar
    /// stay on top of it, so a history load that completes after live updates
    /// never rolls the store back. Returns the number of bars retained.
    pub fn bootstrap(&mut self, history: Vec<Candle>) -> usize {
        let mut ordered: Vec<Candle> = Vec::with_capacity(history.len());
        for candle in history {
            match ordered.last_mut() {
                Some(last) if candle.time == last.time => *last = candle,
                Some(last) if candle.time < last.time => {
                    tracing::warn!(
                        time = candle.time,
                        last_time = last.time,
                        "Dropping out-of-order bar from history."
                    );
                }
                _ => ordered.push(candle),
            }
        }

        match ordered.last().map(|c| c.time) {
            Some(newest) => {
                let live_tail: Vec<Candle> = self
                    .candles
                    .iter()
                    .filter(|c| c.time >= newest)
                    .copied()
                    .collect();
                if live_tail.first().is_some_and(|c| c.time == newest) {
                    ordered.pop();
                }
                ordered.extend(live_tail);
            }
            None => ordered = std::mem::take(&mut self.candles),
        }

        if ordered.len() > self.max_len {
            let excess = ordered.len() - self.max_len;
            ordered.drain(..excess);
        }

        self.candles = ordered;
        self.candles.len()
    }

    /// Merges one live update into the sequence.
    pub fn merge(&mut self, update: Candle) -> MergeOutcome {
        let Some(last) = self.candles.last_mut() else {
            self.candles.push(update);
            return MergeOutcome::Inserted;
        };

        if update.time == last.time {
            *last = update;
            return MergeOutcome::Replaced;
        }

        if update.time < last.time {
            return MergeOutcome::Rejected {
                last_time: last.time,
            };
        }

        self.candles.push(update);
        let evicted = self.candles.len().saturating_sub(self.max_len);
        if evicted > 0 {
            self.candles.drain(..evicted);
        }
        MergeOutcome::Appended { evicted }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}
