//! Stablecoin supply growth (optional), proxied by 24h market cap change

use super::bounds::bounded_score;
use super::http::{decimal_from_value, HttpClient};
use super::types::{FetchError, FetchResult, SourceId, NO_24H_CHANGE, NO_DATA};
use super::SourceFetcher;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

/// Supply expansion is bullish; scales past ±1% and caps at ±2
pub fn normalize(pct_change: Decimal) -> Decimal {
    if pct_change > dec!(1) {
        (dec!(1) + (pct_change - dec!(1)) * dec!(0.5)).min(dec!(2))
    } else if pct_change > dec!(0.1) {
        dec!(0.5)
    } else if pct_change < dec!(-1) {
        (dec!(-1) + (pct_change + dec!(1)) * dec!(0.5)).max(dec!(-2))
    } else if pct_change < dec!(-0.1) {
        dec!(-0.5)
    } else {
        dec!(0)
    }
}

/// Mean 24h market cap change across the returned coins
fn mean_change(payload: &Value) -> Result<Decimal, &'static str> {
    let rows = payload.as_array().filter(|r| !r.is_empty()).ok_or(NO_DATA)?;
    let changes: Vec<Decimal> = rows
        .iter()
        .filter_map(|row| row.get("market_cap_change_percentage_24h"))
        .filter_map(decimal_from_value)
        .collect();
    if changes.is_empty() {
        return Err(NO_24H_CHANGE);
    }
    let total: Decimal = changes.iter().copied().sum();
    Ok(total / Decimal::from(changes.len()))
}

pub struct StablecoinIssuanceFetcher {
    http: HttpClient,
    coingecko_url: String,
}

impl StablecoinIssuanceFetcher {
    pub fn new(http: HttpClient, coingecko_url: impl Into<String>) -> Self {
        Self {
            http,
            coingecko_url: coingecko_url.into(),
        }
    }
}

#[async_trait]
impl SourceFetcher for StablecoinIssuanceFetcher {
    fn source_id(&self) -> SourceId {
        SourceId::StablecoinIssuance
    }

    async fn fetch(&self) -> Result<FetchResult, FetchError> {
        let url = format!("{}/coins/markets", self.coingecko_url.trim_end_matches('/'));
        let query = [
            ("vs_currency", "usd".to_string()),
            ("ids", "tether,usd-coin".to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", "2".to_string()),
        ];
        let payload = self.http.get_json(&url, &query).await?;

        match mean_change(&payload) {
            Ok(pct) => Ok(bounded_score(
                SourceId::StablecoinIssuance,
                pct,
                format!("{:.4}", pct),
                false,
                normalize,
            )),
            Err(code) => Ok(FetchResult::failed(SourceId::StablecoinIssuance, code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_stablecoin() {
        assert_eq!(normalize(dec!(3)), dec!(2));
        assert_eq!(normalize(dec!(2)), dec!(1.5));
        assert_eq!(normalize(dec!(0.5)), dec!(0.5));
        assert_eq!(normalize(dec!(0.05)), dec!(0));
        assert_eq!(normalize(dec!(-0.5)), dec!(-0.5));
        assert_eq!(normalize(dec!(-2)), dec!(-1.5));
        assert_eq!(normalize(dec!(-10)), dec!(-2));
    }

    #[test]
    fn test_mean_change() {
        let payload = json!([
            {"id": "tether", "market_cap_change_percentage_24h": 0.4},
            {"id": "usd-coin", "market_cap_change_percentage_24h": 0.2}
        ]);
        assert_eq!(mean_change(&payload).unwrap(), dec!(0.3));
    }

    #[test]
    fn test_mean_change_errors() {
        assert_eq!(mean_change(&json!([])), Err(NO_DATA));
        assert_eq!(mean_change(&json!([{"id": "tether"}])), Err(NO_24H_CHANGE));
    }
}
