// In crates/engine/src/feed.rs

use api_client::MarketSource;
use core_types::{BarUpdate, Candle, Interval, Symbol};
use events::ConnectionStatus;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Identifies one feed run. Bumped on every interval switch; events carrying
/// an older generation are discarded by the engine.
pub type Generation = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEventKind {
    Status(ConnectionStatus),
    History(Vec<Candle>),
    /// History could not be fetched; the feed continues live-only.
    HistoryFailed(String),
    Bar(BarUpdate),
    /// The live subscription failed or ended; a retry follows after the backoff.
    Disconnected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEvent {
    pub generation: Generation,
    pub kind: FeedEventKind,
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub symbol: Symbol,
    pub interval: Interval,
    pub history_limit: u16,
    pub reconnect_delay: Duration,
}

struct FeedSink {
    generation: Generation,
    tx: mpsc::Sender<FeedEvent>,
}

impl FeedSink {
    /// Returns `false` once the engine has gone away.
    async fn send(&self, kind: FeedEventKind) -> bool {
        self.tx
            .send(FeedEvent {
                generation: self.generation,
                kind,
            })
            .await
            .is_ok()
    }
}

/// Runs the connection lifecycle for one symbol/interval until the engine
/// drops its receiver or the task is aborted.
///
/// `DISCONNECTED -> LOADING_HISTORY -> LIVE`, back to `DISCONNECTED` on any
/// transport or decode error, then a fixed backoff. History is fetched until it
/// succeeds once; a failed fetch never blocks the live subscription. History
/// that only arrives on a later reconnect is laid under the live bars already
/// merged (see [`market_data::CandleStore::bootstrap`]).
pub async fn run_feed(
    source: Arc<dyn MarketSource>,
    settings: FeedSettings,
    generation: Generation,
    tx: mpsc::Sender<FeedEvent>,
) {
    let sink = FeedSink { generation, tx };
    let FeedSettings {
        symbol,
        interval,
        history_limit,
        reconnect_delay,
    } = settings;
    let mut history_loaded = false;

    tracing::info!(%symbol, %interval, generation, "Starting market feed.");

    loop {
        if !history_loaded {
            if !sink
                .send(FeedEventKind::Status(ConnectionStatus::LoadingHistory))
                .await
            {
                return;
            }

            let kind = match source.fetch_history(&symbol, interval, history_limit).await {
                Ok(history) => {
                    history_loaded = true;
                    FeedEventKind::History(history)
                }
                Err(e) => {
                    tracing::warn!(%symbol, %interval, error = %e, "History fetch failed.");
                    FeedEventKind::HistoryFailed(e.to_string())
                }
            };
            if !sink.send(kind).await {
                return;
            }
        }

        let reason = match source.subscribe(&symbol, interval).await {
            Ok(mut stream) => {
                if !sink.send(FeedEventKind::Status(ConnectionStatus::Live)).await {
                    return;
                }

                let mut reason = "stream ended".to_string();
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(update) => {
                            if !sink.send(FeedEventKind::Bar(update)).await {
                                return;
                            }
                        }
                        Err(e) => {
                            reason = e.to_string();
                            break;
                        }
                    }
                }
                reason
            }
            Err(e) => e.to_string(),
        };

        tracing::warn!(%symbol, %interval, %reason, delay = ?reconnect_delay, "Feed disconnected.");
        if !sink.send(FeedEventKind::Disconnected(reason)).await {
            return;
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}
