//! Crypto fear & greed index (contrarian)

use super::bounds::{bounded_score, is_stale};
use super::http::{decimal_from_value, timestamp_from_value, HttpClient};
use super::types::{FetchError, FetchResult, SourceId, NO_DATA};
use super::SourceFetcher;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// alternative.me index endpoint
pub const DEFAULT_FEAR_GREED_URL: &str = "https://api.alternative.me/fng/";

/// Extreme fear is bullish, extreme greed bearish
pub fn normalize(index: Decimal) -> Decimal {
    if index < dec!(25) {
        dec!(2)
    } else if index < dec!(40) {
        dec!(1)
    } else if index > dec!(80) {
        dec!(-2)
    } else if index > dec!(60) {
        dec!(-1)
    } else {
        dec!(0)
    }
}

pub struct FearGreedFetcher {
    http: HttpClient,
    url: String,
}

impl FearGreedFetcher {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SourceFetcher for FearGreedFetcher {
    fn source_id(&self) -> SourceId {
        SourceId::FearGreed
    }

    async fn fetch(&self) -> Result<FetchResult, FetchError> {
        let payload = self
            .http
            .get_json(&self.url, &[("limit", "1".to_string())])
            .await?;

        let Some(item) = payload.pointer("/data/0") else {
            return Ok(FetchResult::failed(SourceId::FearGreed, NO_DATA));
        };
        let index = item
            .get("value")
            .and_then(decimal_from_value)
            .unwrap_or(Decimal::ZERO)
            .trunc();
        let stale = item
            .get("timestamp")
            .and_then(timestamp_from_value)
            .map(|ts| is_stale(SourceId::FearGreed, ts, Utc::now()))
            .unwrap_or(false);

        Ok(bounded_score(
            SourceId::FearGreed,
            index,
            index.to_string(),
            stale,
            normalize,
        ))
    }
}
