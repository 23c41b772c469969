// In crates/api-client/src/types.rs

use crate::{Error, Result};
use core_types::{BarUpdate, Candle};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

/// The client for the public Binance Futures market-data endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The base URL for the Binance Futures REST API.
    pub base_url: String,
}

/// Temporary struct to deserialize the kline response from Binance,
/// which is a JSON array of mixed types.
#[derive(Debug, Deserialize)]
pub struct RawKline(
    pub i64,    // 0: Open time
    pub String, // 1: Open
    pub String, // 2: High
    pub String, // 3: Low
    pub String, // 4: Close
    pub String, // 5: Volume
    pub i64,    // 6: Close time
    pub String, // 7: Quote asset volume
    pub i64,    // 8: Number of trades
    pub String, // 9: Taker buy base asset volume
    pub String, // 10: Taker buy quote asset volume
    pub String, // 11: Ignore
);

fn parse_field(field: &'static str, value: &str) -> Result<Decimal> {
    let price = value.parse().map_err(|_| Error::InvalidKline {
        field,
        value: value.to_string(),
    })?;
    positive(field, price)
}

/// Prices must be strictly positive; a zero or negative price is malformed.
fn positive(field: &'static str, price: Decimal) -> Result<Decimal> {
    if price <= Decimal::ZERO {
        return Err(Error::InvalidKline {
            field,
            value: price.to_string(),
        });
    }
    Ok(price)
}

impl TryFrom<RawKline> for Candle {
    type Error = Error;

    fn try_from(raw: RawKline) -> Result<Self> {
        Ok(Candle {
            time: raw.0 / 1000,
            open: parse_field("open", &raw.1)?,
            high: parse_field("high", &raw.2)?,
            low: parse_field("low", &raw.3)?,
            close: parse_field("close", &raw.4)?,
        })
    }
}

/// Represents a single kline event from a WebSocket stream.
#[derive(Debug, Deserialize, Clone)]
pub struct WsKlineEvent {
    #[serde(rename = "e")]
    pub event_type: String, // "kline"
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "k")]
    pub kline: WsKline,
}

/// Represents the kline data within a WebSocket event.
#[derive(Debug, Deserialize, Clone)]
pub struct WsKline {
    #[serde(rename = "t")]
    pub open_time: i64,
    #[serde(rename = "T")]
    pub close_time: i64,
    #[serde(rename = "i")]
    pub interval: String,
    #[serde(rename = "o")]
    pub open: Decimal,
    #[serde(rename = "c")]
    pub close: Decimal,
    #[serde(rename = "h")]
    pub high: Decimal,
    #[serde(rename = "l")]
    pub low: Decimal,
    #[serde(rename = "x")]
    pub is_closed: bool, // Is this kline final?
}

impl TryFrom<WsKline> for BarUpdate {
    type Error = Error;

    fn try_from(k: WsKline) -> Result<Self> {
        Ok(BarUpdate {
            candle: Candle {
                time: k.open_time / 1000,
                open: positive("open", k.open)?,
                high: positive("high", k.high)?,
                low: positive("low", k.low)?,
                close: positive("close", k.close)?,
            },
            is_closed: k.is_closed,
        })
    }
}

/// Decodes one text frame from a kline stream.
///
/// Frames that are valid JSON but not kline events yield `Ok(None)`.
pub fn decode_kline_message(text: &str) -> Result<Option<BarUpdate>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.get("e").and_then(serde_json::Value::as_str) != Some("kline") {
        return Ok(None);
    }
    let event: WsKlineEvent = serde_json::from_value(value)?;
    Ok(Some(BarUpdate::try_from(event.kline)?))
}
