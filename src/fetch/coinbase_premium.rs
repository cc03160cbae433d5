//! Coinbase premium (optional)
//!
//! Not wired to an upstream yet: returns a neutral score so enabling the
//! flag leaves the composite unchanged.

use super::types::{FetchError, FetchResult, SourceId};
use super::SourceFetcher;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Premium as a fraction; beyond ±50 bps scales linearly, capped at ±2
pub fn normalize(premium: Decimal) -> Decimal {
    if premium > dec!(0.005) {
        (premium * dec!(100)).min(dec!(2))
    } else if premium < dec!(-0.005) {
        (premium * dec!(100)).max(dec!(-2))
    } else {
        dec!(0)
    }
}

#[derive(Debug, Default)]
pub struct CoinbasePremiumFetcher;

#[async_trait]
impl SourceFetcher for CoinbasePremiumFetcher {
    fn source_id(&self) -> SourceId {
        SourceId::CoinbasePremium
    }

    async fn fetch(&self) -> Result<FetchResult, FetchError> {
        Ok(FetchResult::scored(
            SourceId::CoinbasePremium,
            "placeholder",
            Decimal::ZERO,
            false,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_premium() {
        assert_eq!(normalize(dec!(0.01)), dec!(1));
        assert_eq!(normalize(dec!(0.05)), dec!(2));
        assert_eq!(normalize(dec!(-0.03)), dec!(-2));
        assert_eq!(normalize(dec!(0.005)), dec!(0));
    }

    #[tokio::test]
    async fn test_placeholder_is_neutral() {
        let result = CoinbasePremiumFetcher.fetch().await.unwrap();
        assert_eq!(result.normalized_score, Some(dec!(0)));
        assert_eq!(result.raw_value.as_deref(), Some("placeholder"));
    }
}
