// In crates/api-client/src/live_connector.rs

use crate::types::decode_kline_message;
use crate::{BarStream, Error, Result};
use async_stream::stream;
use core_types::{Interval, Symbol};
use futures_util::StreamExt;
use std::time::Duration;
use tokio_tungstenite::connect_async;

/// A connector for receiving live kline streams from Binance.
#[derive(Debug, Clone)]
pub struct LiveConnector {
    ws_base_url: String,
    connect_timeout: Duration,
}

impl LiveConnector {
    pub fn new(ws_base_url: &str, connect_timeout: Duration) -> Self {
        Self {
            ws_base_url: ws_base_url.trim_end_matches('/').to_string(),
            connect_timeout,
        }
    }

    /// The raw-stream URL for a symbol/interval pair.
    pub fn stream_url(&self, symbol: &Symbol, interval: Interval) -> String {
        format!(
            "{}/{}@kline_{}",
            self.ws_base_url,
            symbol.0.to_lowercase(),
            interval.as_str()
        )
    }

    /// Connects once and returns the stream of every bar update, forming or closed.
    ///
    /// The stream yields a single error and ends on a transport error, a close
    /// frame or an undecodable frame. It never reconnects by itself.
    pub async fn subscribe_to_klines(
        &self,
        symbol: &Symbol,
        interval: Interval,
    ) -> Result<BarStream> {
        let url = self.stream_url(symbol, interval);
        tracing::info!(url = %url, "Connecting to WebSocket stream...");

        let (ws_stream, _) = tokio::time::timeout(self.connect_timeout, connect_async(&url))
            .await
            .map_err(|_| Error::Timeout(self.connect_timeout))?
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        tracing::info!(url = %url, "WebSocket connection successful.");

        let mut read = ws_stream.fuse();
        let updates = stream! {
            while let Some(message) = read.next().await {
                match message {
                    Ok(msg) if msg.is_close() => {
                        yield Err(Error::StreamClosed);
                        break;
                    }
                    Ok(msg) if msg.is_text() => {
                        let decoded = msg
                            .to_text()
                            .map_err(|e| Error::WebSocket(e.to_string()))
                            .and_then(decode_kline_message);
                        match decoded {
                            Ok(Some(update)) => yield Ok(update),
                            Ok(None) => {}
                            Err(e) => {
                                tracing::warn!(error = %e, "Undecodable kline frame.");
                                yield Err(e);
                                break;
                            }
                        }
                    }
                    // Ping/pong and binary frames carry no bar data.
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Error reading from WebSocket.");
                        yield Err(Error::WebSocket(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(updates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_uses_lowercase_symbol_and_interval_code() {
        let connector = LiveConnector::new("wss://fstream.binance.com/ws/", Duration::from_secs(5));
        let url = connector.stream_url(&Symbol("BTCUSDT".into()), Interval::FiveMinutes);
        assert_eq!(url, "wss://fstream.binance.com/ws/btcusdt@kline_5m");
    }
}
