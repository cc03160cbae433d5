//! Spot BTC ETF daily net flow

use super::bounds::{bounded_score, is_stale};
use super::http::{decimal_from_value, timestamp_from_value, HttpClient};
use super::types::{FetchError, FetchResult, SourceId, INVALID_ETF_FLOWS_URL};
use super::SourceFetcher;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

/// Default ETF flow endpoint
pub const DEFAULT_ETF_FLOWS_URL: &str = "https://api.sosovalue.com/api/etf-flows";

/// Daily net flow in $M: large inflow is bullish
pub fn normalize(net_flow: Decimal) -> Decimal {
    if net_flow >= dec!(200) {
        dec!(2)
    } else if net_flow >= dec!(0) {
        dec!(1)
    } else if net_flow >= dec!(-200) {
        dec!(-1)
    } else {
        dec!(-2)
    }
}

/// Fetches the configured ETF flow document
pub struct EtfFlowsFetcher {
    http: HttpClient,
    url: String,
}

impl EtfFlowsFetcher {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into().trim().to_string(),
        }
    }

    fn url_is_valid(&self) -> bool {
        let rest = self
            .url
            .strip_prefix("https://")
            .or_else(|| self.url.strip_prefix("http://"));
        matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
    }
}

/// First non-zero flow among the known keys, zero when none carries one
fn parse_net_flow(payload: &Value) -> Decimal {
    ["btc_etf_net_flow_usd", "net_flow"]
        .iter()
        .filter_map(|key| payload.get(*key))
        .filter(|v| !v.is_null())
        .filter_map(decimal_from_value)
        .find(|flow| !flow.is_zero())
        .unwrap_or(Decimal::ZERO)
}

fn parse_as_of(payload: &Value) -> Option<DateTime<Utc>> {
    ["date", "updated", "timestamp", "as_of"]
        .iter()
        .filter_map(|key| payload.get(*key))
        .find(|v| !v.is_null())
        .and_then(timestamp_from_value)
}

#[async_trait]
impl SourceFetcher for EtfFlowsFetcher {
    fn source_id(&self) -> SourceId {
        SourceId::EtfFlows
    }

    async fn fetch(&self) -> Result<FetchResult, FetchError> {
        if !self.url_is_valid() {
            return Ok(FetchResult::failed(SourceId::EtfFlows, INVALID_ETF_FLOWS_URL));
        }

        let payload = self.http.get_json(&self.url, &[]).await?;
        let net_flow = parse_net_flow(&payload);
        let stale = parse_as_of(&payload)
            .map(|ts| is_stale(SourceId::EtfFlows, ts, Utc::now()))
            .unwrap_or(false);

        Ok(bounded_score(
            SourceId::EtfFlows,
            net_flow,
            net_flow.normalize().to_string(),
            stale,
            normalize,
        ))
    }
}
