//! Perpetual funding rate, Binance with Bybit fallback

use super::bounds::{bounded_score, is_stale};
use super::http::{decimal_from_value, timestamp_from_value, HttpClient};
use super::types::{FetchError, FetchResult, SourceId, NO_FUNDING_DATA};
use super::SourceFetcher;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

/// Binance USD-M futures API
pub const DEFAULT_BINANCE_FUTURES_URL: &str = "https://fapi.binance.com";
/// Bybit v5 API
pub const DEFAULT_BYBIT_URL: &str = "https://api.bybit.com";

/// Negative funding is bullish, crowded longs bearish
pub fn normalize(rate: Decimal) -> Decimal {
    let pct = rate * dec!(100);
    if pct < dec!(-0.01) {
        dec!(1)
    } else if pct <= dec!(0.03) {
        dec!(0)
    } else {
        dec!(-1)
    }
}

/// A funding observation from either venue
#[derive(Debug, Clone, PartialEq)]
struct FundingObservation {
    rate: Decimal,
    observed_at: Option<DateTime<Utc>>,
}

pub struct FundingFetcher {
    http: HttpClient,
    binance_url: String,
    bybit_url: String,
}

impl FundingFetcher {
    pub fn new(http: HttpClient, binance_url: impl Into<String>, bybit_url: impl Into<String>) -> Self {
        Self {
            http,
            binance_url: binance_url.into(),
            bybit_url: bybit_url.into(),
        }
    }

    async fn fetch_binance(&self) -> Result<FundingObservation, FetchError> {
        let url = format!("{}/fapi/v1/premiumIndex", self.binance_url.trim_end_matches('/'));
        let payload = self
            .http
            .get_json(&url, &[("symbol", "BTCUSDT".to_string())])
            .await?;
        Ok(parse_binance(&payload))
    }

    async fn fetch_bybit(&self) -> Result<Option<FundingObservation>, FetchError> {
        let url = format!("{}/v5/market/funding/history", self.bybit_url.trim_end_matches('/'));
        let query = [
            ("category", "linear".to_string()),
            ("symbol", "BTCUSDT".to_string()),
            ("limit", "1".to_string()),
        ];
        let payload = self.http.get_json(&url, &query).await?;
        Ok(parse_bybit(&payload))
    }
}

fn parse_binance(payload: &Value) -> FundingObservation {
    FundingObservation {
        rate: payload
            .get("lastFundingRate")
            .and_then(decimal_from_value)
            .unwrap_or(Decimal::ZERO),
        observed_at: payload.get("time").and_then(timestamp_from_value),
    }
}

/// Newest entry of Bybit's funding history; None when the list is empty
fn parse_bybit(payload: &Value) -> Option<FundingObservation> {
    let item = payload.pointer("/result/list")?.as_array()?.first()?;
    Some(FundingObservation {
        rate: item
            .get("fundingRate")
            .and_then(decimal_from_value)
            .unwrap_or(Decimal::ZERO),
        observed_at: item.get("fundingRateTimestamp").and_then(timestamp_from_value),
    })
}

#[async_trait]
impl SourceFetcher for FundingFetcher {
    fn source_id(&self) -> SourceId {
        SourceId::Funding
    }

    async fn fetch(&self) -> Result<FetchResult, FetchError> {
        let observation = match self.fetch_binance().await {
            Ok(obs) => obs,
            Err(FetchError::RegionBlocked(_)) => {
                tracing::debug!(source_id = %SourceId::Funding, "binance_region_blocked_using_bybit");
                match self.fetch_bybit().await? {
                    Some(obs) => obs,
                    None => return Ok(FetchResult::failed(SourceId::Funding, NO_FUNDING_DATA)),
                }
            }
            Err(e) => return Err(e),
        };

        let stale = observation
            .observed_at
            .map(|ts| is_stale(SourceId::Funding, ts, Utc::now()))
            .unwrap_or(false);

        Ok(bounded_score(
            SourceId::Funding,
            observation.rate,
            observation.rate.normalize().to_string(),
            stale,
            normalize,
        ))
    }
}
