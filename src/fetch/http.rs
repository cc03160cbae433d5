//! Shared HTTP plumbing for source fetchers

use super::types::FetchError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

/// Thin JSON GET client with status classification
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("poly-signal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// GET a JSON document
    ///
    /// 451 and 429 are reported as distinct errors so callers can fall back
    /// to another venue or let the retry wrapper back off.
    pub async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if status == StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS {
            return Err(FetchError::RegionBlocked(url.to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Read a decimal from a JSON string or number
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(|f| Decimal::try_from(f).ok())
            }
        }
        _ => None,
    }
}

/// Read an f64 from a JSON string or number
pub fn f64_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Interpret epoch seconds or milliseconds
pub fn timestamp_from_epoch(epoch: i64) -> Option<DateTime<Utc>> {
    if epoch.abs() > 1_000_000_000_000 {
        Utc.timestamp_millis_opt(epoch).single()
    } else {
        Utc.timestamp_opt(epoch, 0).single()
    }
}

/// Read a timestamp from epoch seconds/ms (number or numeric string),
/// RFC 3339, naive UTC date-times, or a bare `YYYY-MM-DD` date
pub fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(timestamp_from_epoch),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(epoch) = s.parse::<i64>() {
                return timestamp_from_epoch(epoch);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                    return Some(Utc.from_utc_datetime(&naive));
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decimal_from_string_and_number() {
        assert_eq!(decimal_from_value(&json!("0.00010000")), Some(dec!(0.0001)));
        assert_eq!(decimal_from_value(&json!(42)), Some(dec!(42)));
        assert_eq!(decimal_from_value(&json!("1e-4")), Some(dec!(0.0001)));
        assert_eq!(decimal_from_value(&json!(null)), None);
        assert_eq!(decimal_from_value(&json!("abc")), None);
    }

    #[test]
    fn test_timestamp_seconds_and_millis() {
        let secs = timestamp_from_value(&json!(1_700_000_000)).unwrap();
        let millis = timestamp_from_value(&json!(1_700_000_000_000i64)).unwrap();
        assert_eq!(secs, millis);
        assert_eq!(timestamp_from_value(&json!("1700000000")), Some(secs));
    }

    #[test]
    fn test_timestamp_iso_and_date() {
        let iso = timestamp_from_value(&json!("2024-01-02T03:04:05Z")).unwrap();
        assert_eq!(iso.to_rfc3339(), "2024-01-02T03:04:05+00:00");
        let date = timestamp_from_value(&json!("2024-01-02")).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-01-02T00:00:00+00:00");
        let naive = timestamp_from_value(&json!("2024-03-20 18:00:00")).unwrap();
        assert_eq!(naive.to_rfc3339(), "2024-03-20T18:00:00+00:00");
        assert!(timestamp_from_value(&json!("yesterday")).is_none());
    }
}
