//! Return of the last closed 1h candle, used for short-horizon markets

use super::bounds::{bounded_score, max_age};
use super::http::HttpClient;
use super::klines::{fetch_klines, Candle};
use super::types::{FetchError, FetchResult, SourceId, INSUFFICIENT_KLINES};
use super::SourceFetcher;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Step function on the 1h return expressed in percent
pub fn normalize(ret: Decimal) -> Decimal {
    let pct = ret * dec!(100);
    if pct >= dec!(1) {
        dec!(2)
    } else if pct >= dec!(0.5) {
        dec!(1)
    } else if pct >= dec!(0.1) {
        dec!(0.5)
    } else if pct >= dec!(-0.1) {
        dec!(0)
    } else if pct >= dec!(-0.5) {
        dec!(-0.5)
    } else if pct >= dec!(-1) {
        dec!(-1)
    } else {
        dec!(-2)
    }
}

/// (close - open) / open of the second to last candle; the last may still be open
pub fn last_closed_return(candles: &[Candle]) -> Option<f64> {
    if candles.len() < 2 {
        return None;
    }
    let candle = &candles[candles.len() - 2];
    if candle.open <= 0.0 {
        return None;
    }
    Some((candle.close - candle.open) / candle.open)
}

pub struct MomentumFetcher {
    http: HttpClient,
    binance_url: String,
}

impl MomentumFetcher {
    pub fn new(http: HttpClient, binance_url: impl Into<String>) -> Self {
        Self {
            http,
            binance_url: binance_url.into(),
        }
    }
}

#[async_trait]
impl SourceFetcher for MomentumFetcher {
    fn source_id(&self) -> SourceId {
        SourceId::Price1hMomentum
    }

    async fn fetch(&self) -> Result<FetchResult, FetchError> {
        let url = format!("{}/api/v3/klines", self.binance_url.trim_end_matches('/'));
        let candles = fetch_klines(&self.http, &url, "BTCUSDT", "1h", 4).await?;

        let Some(ret) = last_closed_return(&candles).and_then(|r| Decimal::try_from(r).ok()) else {
            return Ok(FetchResult::failed(SourceId::Price1hMomentum, INSUFFICIENT_KLINES));
        };

        // A newer hour should have closed within the freshness budget
        let budget = Duration::hours(1) + max_age(SourceId::Price1hMomentum);
        let stale = candles[candles.len() - 2]
            .close_time_utc()
            .map(|closed_at| Utc::now() - closed_at > budget)
            .unwrap_or(false);

        Ok(bounded_score(
            SourceId::Price1hMomentum,
            ret,
            format!("{:.2}%", ret * dec!(100)),
            stale,
            normalize,
        ))
    }
}
