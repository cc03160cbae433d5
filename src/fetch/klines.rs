//! Binance kline parsing and retrieval

use super::http::{f64_from_value, timestamp_from_epoch, HttpClient};
use super::types::FetchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time (ms since epoch)
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Close time (ms since epoch), when upstream provides it
    pub close_time: Option<i64>,
}

impl Candle {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    pub fn close_time_utc(&self) -> Option<DateTime<Utc>> {
        self.close_time.and_then(timestamp_from_epoch)
    }

    fn from_row(row: &Value) -> Option<Self> {
        let fields = row.as_array()?;
        if fields.len() < 6 {
            return None;
        }
        Some(Self {
            open_time: fields[0].as_i64()?,
            open: f64_from_value(&fields[1])?,
            high: f64_from_value(&fields[2])?,
            low: f64_from_value(&fields[3])?,
            close: f64_from_value(&fields[4])?,
            volume: f64_from_value(&fields[5])?,
            close_time: fields.get(6).and_then(Value::as_i64),
        })
    }
}

/// Parse a Binance klines array; malformed or short rows are dropped
pub fn parse_klines(payload: &Value) -> Vec<Candle> {
    payload
        .as_array()
        .map(|rows| rows.iter().filter_map(Candle::from_row).collect())
        .unwrap_or_default()
}

/// GET klines for a symbol and interval
pub async fn fetch_klines(
    http: &HttpClient,
    url: &str,
    symbol: &str,
    interval: &str,
    limit: u32,
) -> Result<Vec<Candle>, FetchError> {
    let query = [
        ("symbol", symbol.to_string()),
        ("interval", interval.to_string()),
        ("limit", limit.to_string()),
    ];
    let payload = http.get_json(url, &query).await?;
    if !payload.is_array() {
        return Err(FetchError::Decode("klines payload is not an array".into()));
    }
    Ok(parse_klines(&payload))
}

/// 1-minute BTCUSDT klines for the intraday engine
///
/// Never fails: errors are logged and yield an empty set, which the
/// intraday engine treats as insufficient history.
pub async fn fetch_klines_1m(http: &HttpClient, url: &str, limit: u32) -> Vec<Candle> {
    match fetch_klines(http, url, "BTCUSDT", "1m", limit).await {
        Ok(candles) => candles,
        Err(e) => {
            tracing::warn!(error = %e, "klines_1m_fetch_failed");
            Vec::new()
        }
    }
}
