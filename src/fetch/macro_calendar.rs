//! FOMC / CPI calendar proximity

use super::http::{timestamp_from_value, HttpClient};
use super::types::{FetchError, FetchResult, SourceId};
use super::SourceFetcher;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

/// FMP economic calendar
pub const DEFAULT_FMP_CALENDAR_URL: &str = "https://financialmodelingprep.com/stable/economic-calendar";

/// Event-name fragments treated as high impact
const MACRO_KEYWORDS: [&str; 5] = ["fomc", "fed rate", "cpi ", " consumer price ", "consumer price index"];
const LOOKAHEAD_HOURS: i64 = 48;

const RAW_EVENT: &str = "fomc_cpi_48h";
const RAW_NO_EVENT: &str = "no_event";
const SCORE_EVENT: Decimal = dec!(-1);
const SCORE_NO_EVENT: Decimal = dec!(0.5);

/// Macro scores are already on the composite scale
pub fn normalize(score: Decimal) -> Decimal {
    score
}

/// True when a high-impact event is scheduled within the lookahead window
pub fn high_impact_event_ahead(events: &[Value], now: DateTime<Utc>) -> bool {
    let cutoff = now + Duration::hours(LOOKAHEAD_HOURS);
    events.iter().any(|item| {
        let name = ["event", "title", "name"]
            .iter()
            .find_map(|k| item.get(*k).and_then(Value::as_str))
            .unwrap_or_default()
            .to_lowercase();
        if !MACRO_KEYWORDS.iter().any(|kw| name.contains(kw)) {
            return false;
        }
        ["date", "releaseDate", "timestamp"]
            .iter()
            .filter_map(|k| item.get(*k))
            .find(|v| !v.is_null())
            .and_then(timestamp_from_value)
            .is_some_and(|ts| ts >= now && ts <= cutoff)
    })
}

/// Calendar rows from a bare array or a `data`/`events` envelope
fn calendar_rows(payload: &Value) -> Vec<Value> {
    payload
        .as_array()
        .or_else(|| payload.get("data").and_then(Value::as_array))
        .or_else(|| payload.get("events").and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

/// Scores the next 48h of the macro calendar
///
/// Without an API key, and on any upstream failure, the source reports a
/// neutral "no event" so a calendar outage never blocks a decision.
pub struct MacroFetcher {
    http: HttpClient,
    url: String,
    api_key: Option<String>,
}

impl MacroFetcher {
    pub fn new(http: HttpClient, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            url: url.into(),
            api_key: api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
        }
    }

    fn no_event() -> FetchResult {
        FetchResult::scored(SourceId::Macro, RAW_NO_EVENT, SCORE_NO_EVENT, false)
    }
}

#[async_trait]
impl SourceFetcher for MacroFetcher {
    fn source_id(&self) -> SourceId {
        SourceId::Macro
    }

    async fn fetch(&self) -> Result<FetchResult, FetchError> {
        let Some(api_key) = &self.api_key else {
            return Ok(Self::no_event());
        };

        let payload = match self.http.get_json(&self.url, &[("apikey", api_key.clone())]).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(source_id = %SourceId::Macro, error = %e, "macro_calendar_unavailable");
                return Ok(Self::no_event().with_error(e.to_string()));
            }
        };

        if high_impact_event_ahead(&calendar_rows(&payload), Utc::now()) {
            Ok(FetchResult::scored(SourceId::Macro, RAW_EVENT, SCORE_EVENT, false))
        } else {
            Ok(Self::no_event())
        }
    }
}
