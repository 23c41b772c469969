// In crates/api-client/src/lib.rs

use app_config::types::BinanceSettings;
use async_trait::async_trait;
use core_types::{BarUpdate, Candle, Interval, Symbol};
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;
use std::time::Duration;

pub mod error;
pub mod live_connector;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use live_connector::LiveConnector;
pub use types::*;

/// A live stream of bar updates. It ends (or yields an error) when the
/// underlying connection is lost; reconnecting is the caller's job.
pub type BarStream = Pin<Box<dyn Stream<Item = Result<BarUpdate>> + Send>>;

/// The upstream price source the market feed depends on.
///
/// Only the shape matters to the feed: an ordered history fetch and a live
/// subscription of incremental bar updates.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetches up to `limit` most recent bars, oldest first.
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        interval: Interval,
        limit: u16,
    ) -> Result<Vec<Candle>>;

    /// Opens a live subscription for the symbol and interval.
    async fn subscribe(&self, symbol: &Symbol, interval: Interval) -> Result<BarStream>;
}

impl ApiClient {
    /// Constructs a new ApiClient from BinanceSettings.
    pub fn new(settings: &BinanceSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(ApiClient {
            http_client,
            base_url: settings.rest_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches historical kline (candlestick) data.
    ///
    /// This corresponds to the `GET /fapi/v1/klines` endpoint.
    ///
    /// # Arguments
    ///
    /// * `symbol`: The symbol to fetch klines for.
    /// * `interval`: The kline interval.
    /// * `limit`: Number of klines to return (max 1500).
    pub async fn get_historical_klines(
        &self,
        symbol: &Symbol,
        interval: Interval,
        limit: u16,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            symbol.0,
            interval.as_str(),
            limit
        );

        let response_body = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        // Deserialize the raw response into a vector of RawKline.
        let raw_klines: Vec<RawKline> = serde_json::from_str(&response_body).map_err(|e| {
            // If deserialization fails, it might be a Binance error object.
            if let Ok(value) = serde_json::from_str::<Value>(&response_body) {
                if let Some(code) = value.get("code").and_then(Value::as_i64) {
                    let msg = value
                        .get("msg")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string();
                    return Error::ApiError { code, msg };
                }
            }
            Error::DeserializationFailed(e)
        })?;

        raw_klines.into_iter().map(Candle::try_from).collect()
    }
}

// Free function to allow api_client::new usage
pub fn new(settings: &BinanceSettings) -> Result<ApiClient> {
    ApiClient::new(settings)
}

/// The Binance-backed [`MarketSource`]: REST for history, WebSocket for live bars.
#[derive(Debug, Clone)]
pub struct BinanceMarketSource {
    api_client: ApiClient,
    live_connector: LiveConnector,
}

impl BinanceMarketSource {
    pub fn new(settings: &BinanceSettings) -> Result<Self> {
        Ok(Self {
            api_client: ApiClient::new(settings)?,
            live_connector: LiveConnector::new(
                &settings.ws_base_url,
                Duration::from_secs(settings.connect_timeout_secs),
            ),
        })
    }
}

#[async_trait]
impl MarketSource for BinanceMarketSource {
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        interval: Interval,
        limit: u16,
    ) -> Result<Vec<Candle>> {
        self.api_client
            .get_historical_klines(symbol, interval, limit)
            .await
    }

    async fn subscribe(&self, symbol: &Symbol, interval: Interval) -> Result<BarStream> {
        self.live_connector.subscribe_to_klines(symbol, interval).await
    }
}
