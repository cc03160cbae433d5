//! US dollar index 5-day trend

use super::bounds::{bounded_score, is_stale};
use super::http::{decimal_from_value, timestamp_from_value, HttpClient};
use super::types::{FetchError, FetchResult, SourceId, INSUFFICIENT_DATA};
use super::SourceFetcher;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

/// Yahoo Finance chart endpoint for DX-Y.NYB
pub const DEFAULT_DXY_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart/DX-Y.NYB";

/// A weakening dollar is bullish for BTC
pub fn normalize(pct_change: Decimal) -> Decimal {
    if pct_change <= dec!(-1) {
        dec!(2)
    } else if pct_change < dec!(0) {
        dec!(1)
    } else if pct_change <= dec!(1) {
        dec!(-1)
    } else {
        dec!(-2)
    }
}

#[derive(Debug, PartialEq)]
struct DxyTrend {
    pct_change: Decimal,
    last_at: Option<DateTime<Utc>>,
}

/// Percent change first to last close; None with fewer than two closes
fn parse_chart(payload: &Value) -> Option<DxyTrend> {
    let chart = payload.pointer("/chart/result/0")?;
    let closes: Vec<Decimal> = chart
        .pointer("/indicators/quote/0/close")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(decimal_from_value).collect())
        .unwrap_or_default();
    if closes.len() < 2 {
        return None;
    }

    let first = closes[0];
    let last = closes[closes.len() - 1];
    let pct_change = if first.is_zero() {
        Decimal::ZERO
    } else {
        (last - first) / first * dec!(100)
    };

    let last_at = chart
        .get("timestamp")
        .and_then(Value::as_array)
        .and_then(|ts| ts.last())
        .and_then(timestamp_from_value);

    Some(DxyTrend { pct_change, last_at })
}

pub struct DxyFetcher {
    http: HttpClient,
    url: String,
}

impl DxyFetcher {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SourceFetcher for DxyFetcher {
    fn source_id(&self) -> SourceId {
        SourceId::Dxy
    }

    async fn fetch(&self) -> Result<FetchResult, FetchError> {
        let query = [("range", "5d".to_string()), ("interval", "1d".to_string())];
        let payload = self.http.get_json(&self.url, &query).await?;

        let Some(trend) = parse_chart(&payload) else {
            return Ok(FetchResult::failed(SourceId::Dxy, INSUFFICIENT_DATA));
        };
        let stale = trend
            .last_at
            .map(|ts| is_stale(SourceId::Dxy, ts, Utc::now()))
            .unwrap_or(false);

        Ok(bounded_score(
            SourceId::Dxy,
            trend.pct_change,
            format!("{:.2}", trend.pct_change),
            stale,
            normalize,
        ))
    }
}
