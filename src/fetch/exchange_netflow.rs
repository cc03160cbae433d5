//! Exchange BTC net flow
//!
//! No free upstream exists, so the fetcher reports `no_api_key` and the
//! scorer renormalizes around it. The normalizer is kept so a keyed
//! provider can be dropped in.

use super::types::{FetchError, FetchResult, SourceId, NO_API_KEY};
use super::SourceFetcher;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 7-day BTC net flow onto exchanges: inflows are bearish
pub fn normalize(netflow_btc: Decimal) -> Decimal {
    if netflow_btc >= dec!(5000) {
        dec!(-2)
    } else if netflow_btc > dec!(0) {
        dec!(-1)
    } else if netflow_btc >= dec!(-5000) {
        dec!(1)
    } else {
        dec!(2)
    }
}

#[derive(Debug, Default)]
pub struct ExchangeNetflowFetcher;

#[async_trait]
impl SourceFetcher for ExchangeNetflowFetcher {
    fn source_id(&self) -> SourceId {
        SourceId::ExchangeNetflow
    }

    async fn fetch(&self) -> Result<FetchResult, FetchError> {
        Ok(FetchResult::failed(SourceId::ExchangeNetflow, NO_API_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_netflow() {
        assert_eq!(normalize(dec!(5000)), dec!(-2));
        assert_eq!(normalize(dec!(1)), dec!(-1));
        assert_eq!(normalize(dec!(0)), dec!(1));
        assert_eq!(normalize(dec!(-5001)), dec!(2));
    }

    #[tokio::test]
    async fn test_reports_missing_key() {
        let result = ExchangeNetflowFetcher.fetch().await.unwrap();
        assert_eq!(result.error.as_deref(), Some(NO_API_KEY));
        assert!(result.normalized_score.is_none());
    }
}
