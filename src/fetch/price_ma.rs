//! Spot price deviation from the 50-day moving average

use super::bounds::{bounded_score, is_stale};
use super::http::{f64_from_value, timestamp_from_epoch, timestamp_from_value, HttpClient};
use super::klines::fetch_klines;
use super::types::{FetchError, FetchResult, SourceId, INSUFFICIENT_KLINES, OUT_OF_RANGE};
use super::SourceFetcher;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

/// Binance spot API
pub const DEFAULT_BINANCE_SPOT_URL: &str = "https://api.binance.com";
/// CoinGecko v3 API
pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

const MA_PERIOD: usize = 50;
/// Relative Binance vs CoinGecko last price gap that flags the result stale
const PRICE_DISCREPANCY_THRESHOLD: f64 = 0.01;

/// Above a rising average is bullish
pub fn normalize(pct_deviation: Decimal) -> Decimal {
    if pct_deviation >= dec!(5) {
        dec!(1)
    } else if pct_deviation > dec!(0) {
        dec!(0.5)
    } else if pct_deviation >= dec!(-5) {
        dec!(-0.5)
    } else {
        dec!(-1)
    }
}

/// Percent deviation of the last close from the mean of the 50 closes before it
///
/// Returns (pct, last_close).
pub fn pct_vs_ma(closes: &[f64]) -> Option<(f64, f64)> {
    if closes.len() < MA_PERIOD + 1 {
        return None;
    }
    let window = &closes[closes.len() - MA_PERIOD - 1..closes.len() - 1];
    let ma = window.iter().sum::<f64>() / MA_PERIOD as f64;
    if ma == 0.0 {
        return None;
    }
    let price = closes[closes.len() - 1];
    Some(((price - ma) / ma * 100.0, price))
}

/// CoinGecko market_chart `prices` as (timestamp, price)
fn parse_market_chart(payload: &Value) -> Vec<(Option<DateTime<Utc>>, f64)> {
    payload
        .get("prices")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let pair = row.as_array()?;
                    let price = f64_from_value(pair.get(1)?)?;
                    Some((pair.first().and_then(timestamp_from_value), price))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub struct PriceMaFetcher {
    http: HttpClient,
    binance_url: String,
    coingecko_url: String,
}

impl PriceMaFetcher {
    pub fn new(http: HttpClient, binance_url: impl Into<String>, coingecko_url: impl Into<String>) -> Self {
        Self {
            http,
            binance_url: binance_url.into(),
            coingecko_url: coingecko_url.into(),
        }
    }

    async fn market_chart(&self) -> Result<Vec<(Option<DateTime<Utc>>, f64)>, FetchError> {
        let url = format!(
            "{}/coins/bitcoin/market_chart",
            self.coingecko_url.trim_end_matches('/')
        );
        let query = [("vs_currency", "usd".to_string()), ("days", "60".to_string())];
        let payload = self.http.get_json(&url, &query).await?;
        Ok(parse_market_chart(&payload))
    }

    fn score(pct: f64, stale: bool) -> FetchResult {
        match Decimal::try_from(pct) {
            Ok(value) => bounded_score(SourceId::PriceMa, value, format!("{pct:.2}"), stale, normalize),
            Err(_) => FetchResult::rejected(SourceId::PriceMa, format!("{pct}"), OUT_OF_RANGE),
        }
    }

    async fn from_binance(&self) -> Result<FetchResult, FetchError> {
        let url = format!("{}/api/v3/klines", self.binance_url.trim_end_matches('/'));
        let candles = fetch_klines(&self.http, &url, "BTCUSDT", "1d", (MA_PERIOD + 1) as u32).await?;

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let Some((pct, last_close)) = pct_vs_ma(&closes) else {
            return Ok(FetchResult::failed(SourceId::PriceMa, INSUFFICIENT_KLINES));
        };

        // Age runs from the open of the last daily bar, not its close
        let now = Utc::now();
        let mut stale = candles
            .last()
            .and_then(|c| timestamp_from_epoch(c.open_time))
            .map(|ts| is_stale(SourceId::PriceMa, ts, now))
            .unwrap_or(false);

        // Cross-check against a second venue; its failure does not matter
        if last_close > 0.0 {
            if let Ok(chart) = self.market_chart().await {
                if let Some((_, reference)) = chart.last() {
                    let gap = (last_close - reference).abs() / last_close;
                    if gap > PRICE_DISCREPANCY_THRESHOLD {
                        tracing::warn!(
                            source_id = %SourceId::PriceMa,
                            binance = last_close,
                            coingecko = reference,
                            "price_discrepancy"
                        );
                        stale = true;
                    }
                }
            }
        }

        Ok(Self::score(pct, stale))
    }

    async fn from_coingecko(&self) -> Result<FetchResult, FetchError> {
        let chart = self.market_chart().await?;
        if chart.len() < MA_PERIOD + 1 {
            return Ok(FetchResult::failed(SourceId::PriceMa, INSUFFICIENT_KLINES));
        }
        let closes: Vec<f64> = chart[chart.len() - MA_PERIOD - 1..]
            .iter()
            .map(|(_, price)| *price)
            .collect();
        let Some((pct, _)) = pct_vs_ma(&closes) else {
            return Ok(FetchResult::failed(SourceId::PriceMa, INSUFFICIENT_KLINES));
        };
        let stale = chart
            .last()
            .and_then(|(ts, _)| *ts)
            .map(|ts| is_stale(SourceId::PriceMa, ts, Utc::now()))
            .unwrap_or(false);
        Ok(Self::score(pct, stale))
    }
}

#[async_trait]
impl SourceFetcher for PriceMaFetcher {
    fn source_id(&self) -> SourceId {
        SourceId::PriceMa
    }

    async fn fetch(&self) -> Result<FetchResult, FetchError> {
        match self.from_binance().await {
            Ok(result) if result.error.is_none() => Ok(result),
            Ok(result) => {
                tracing::debug!(
                    source_id = %SourceId::PriceMa,
                    error = result.error.as_deref().unwrap_or_default(),
                    "binance_unusable_using_coingecko"
                );
                self.from_coingecko().await
            }
            Err(FetchError::RegionBlocked(_)) => {
                tracing::debug!(source_id = %SourceId::PriceMa, "binance_region_blocked_using_coingecko");
                self.from_coingecko().await
            }
            Err(e) => {
                tracing::warn!(source_id = %SourceId::PriceMa, error = %e, "binance_failed_using_coingecko");
                self.from_coingecko().await
            }
        }
    }
}
