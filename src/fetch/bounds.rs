//! Sanity bounds and freshness budgets per source

use super::types::{FetchResult, SourceId, OUT_OF_RANGE};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Inclusive range of plausible raw values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: Decimal,
    pub max: Decimal,
}

impl Bounds {
    fn symmetric(limit: Decimal) -> Self {
        Self {
            min: -limit,
            max: limit,
        }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Raw value bounds; None means unbounded
pub fn bounds_for(source: SourceId) -> Option<Bounds> {
    match source {
        SourceId::FearGreed => Some(Bounds {
            min: dec!(0),
            max: dec!(100),
        }),
        SourceId::Funding => Some(Bounds::symmetric(dec!(0.05))),
        SourceId::Dxy => Some(Bounds::symmetric(dec!(20))),
        SourceId::PriceMa => Some(Bounds::symmetric(dec!(30))),
        SourceId::EtfFlows => Some(Bounds::symmetric(dec!(5000))),
        SourceId::ExchangeNetflow => Some(Bounds::symmetric(dec!(100000))),
        SourceId::CoinbasePremium => Some(Bounds::symmetric(dec!(0.1))),
        SourceId::StablecoinIssuance => Some(Bounds::symmetric(dec!(50))),
        SourceId::Macro | SourceId::Price1hMomentum => None,
    }
}

/// True when the value is plausible for the source
pub fn within_bounds(source: SourceId, value: Decimal) -> bool {
    bounds_for(source).map_or(true, |b| b.contains(value))
}

/// Bounds-check then normalize; out-of-range values never reach the normalizer
pub fn bounded_score(
    source: SourceId,
    value: Decimal,
    raw: String,
    stale: bool,
    normalize: impl FnOnce(Decimal) -> Decimal,
) -> FetchResult {
    if !within_bounds(source, value) {
        tracing::warn!(source_id = %source, value = %value, "value_out_of_range");
        return FetchResult::rejected(source, raw, OUT_OF_RANGE);
    }
    FetchResult::scored(source, raw, normalize(value), stale)
}

/// How old upstream data may be before it is flagged stale
pub fn max_age(source: SourceId) -> Duration {
    match source {
        SourceId::Funding => Duration::hours(8),
        SourceId::PriceMa | SourceId::CoinbasePremium => Duration::hours(1),
        SourceId::Price1hMomentum => Duration::minutes(10),
        _ => Duration::hours(24),
    }
}

/// Staleness of an upstream timestamp against the source's budget
pub fn is_stale(source: SourceId, observed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - observed_at > max_age(source)
}
