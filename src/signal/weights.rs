//! Factor weights and the composite score

use crate::config::SourcesConfig;
use crate::fetch::{FetchResult, SourceId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SCORE_LIMIT: Decimal = dec!(2);
const OPTIONAL_SOURCE_WEIGHT: Decimal = dec!(0.05);

/// Source weights in [0, 1]; they need not sum to one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable(BTreeMap<SourceId, Decimal>);

impl WeightTable {
    pub fn new(weights: impl IntoIterator<Item = (SourceId, Decimal)>) -> Self {
        Self(weights.into_iter().collect())
    }

    /// Long-horizon (daily) weights
    pub fn default_weights() -> Self {
        Self::new([
            (SourceId::EtfFlows, dec!(0.25)),
            (SourceId::ExchangeNetflow, dec!(0.20)),
            (SourceId::Dxy, dec!(0.15)),
            (SourceId::FearGreed, dec!(0.10)),
            (SourceId::PriceMa, dec!(0.15)),
            (SourceId::Funding, dec!(0.10)),
            (SourceId::Macro, dec!(0.05)),
        ])
    }

    /// Short-horizon weights; macro, ETF, and DXY are zeroed
    pub fn hourly() -> Self {
        Self::new([
            (SourceId::Price1hMomentum, dec!(0.35)),
            (SourceId::Funding, dec!(0.20)),
            (SourceId::FearGreed, dec!(0.15)),
            (SourceId::PriceMa, dec!(0.15)),
            (SourceId::ExchangeNetflow, dec!(0.15)),
            (SourceId::EtfFlows, Decimal::ZERO),
            (SourceId::Dxy, Decimal::ZERO),
            (SourceId::Macro, Decimal::ZERO),
            (SourceId::CoinbasePremium, Decimal::ZERO),
            (SourceId::StablecoinIssuance, Decimal::ZERO),
        ])
    }

    /// Default weights with optional sources and overrides applied
    ///
    /// Optional sources enter at 5% only when their fetcher is enabled.
    pub fn resolve(sources: &SourcesConfig) -> Self {
        let mut table = Self::default_weights();
        let optional = [
            (SourceId::CoinbasePremium, sources.fetch_coinbase_premium),
            (SourceId::StablecoinIssuance, sources.fetch_stablecoin_issuance),
        ];
        for (source, enabled) in optional {
            if enabled {
                table.0.insert(source, OPTIONAL_SOURCE_WEIGHT);
            }
        }
        for (source, weight) in &sources.weights {
            let optional_disabled = optional.iter().any(|(s, enabled)| s == source && !enabled);
            if !optional_disabled {
                table.0.insert(*source, *weight);
            }
        }
        table
    }

    /// Weight for a source; zero when absent
    pub fn get(&self, source: SourceId) -> Decimal {
        self.0.get(&source).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, Decimal)> + '_ {
        self.0.iter().map(|(s, w)| (*s, *w))
    }

    /// Sum of all configured weights
    pub fn total(&self) -> Decimal {
        self.0.values().copied().sum()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::default_weights()
    }
}

/// Composite score in [-2, 2]
///
/// Averages the scored results by the weight actually present, so missing
/// sources shift the composite toward those that responded instead of
/// toward zero. Neutral when nothing carries weight.
pub fn weighted_score<'a>(results: impl IntoIterator<Item = &'a FetchResult>, weights: &WeightTable) -> Decimal {
    let mut total = Decimal::ZERO;
    let mut total_weight = Decimal::ZERO;
    for result in results {
        let Some(score) = result.normalized_score else {
            continue;
        };
        let weight = weights.get(result.source_id);
        total += score * weight;
        total_weight += weight;
    }
    if total_weight <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (total / total_weight).clamp(-SCORE_LIMIT, SCORE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(source: SourceId, score: Decimal) -> FetchResult {
        FetchResult::scored(source, "x", score, false)
    }

    #[test]
    fn test_all_missing_is_neutral() {
        let results = vec![
            FetchResult::failed(SourceId::EtfFlows, "boom"),
            FetchResult::failed(SourceId::Dxy, "circuit_open"),
        ];
        assert_eq!(weighted_score(&results, &WeightTable::default()), dec!(0));
        assert_eq!(weighted_score(&Vec::<FetchResult>::new(), &WeightTable::default()), dec!(0));
    }

    #[test]
    fn test_single_source_renormalized() {
        let weights = WeightTable::new([(SourceId::Funding, dec!(1.0)), (SourceId::Dxy, dec!(0.5))]);
        let results = vec![scored(SourceId::Funding, dec!(2)), FetchResult::failed(SourceId::Dxy, "x")];
        assert_eq!(weighted_score(&results, &weights), dec!(2));
    }

    #[test]
    fn test_weighted_average() {
        let weights = WeightTable::default();
        let results = vec![scored(SourceId::EtfFlows, dec!(2)), scored(SourceId::Dxy, dec!(-1))];
        // (0.5 - 0.15) / 0.40
        assert_eq!(weighted_score(&results, &weights), dec!(0.875));
    }

    #[test]
    fn test_zero_weight_sources_ignored() {
        let results = vec![scored(SourceId::Macro, dec!(-1))];
        assert_eq!(weighted_score(&results, &WeightTable::hourly()), dec!(0));
    }

    #[test]
    fn test_clamped() {
        let weights = WeightTable::new([(SourceId::Funding, dec!(1))]);
        let results = vec![scored(SourceId::Funding, dec!(5))];
        assert_eq!(weighted_score(&results, &weights), dec!(2));
    }

    #[test]
    fn test_resolve_optional_and_overrides() {
        let mut sources = SourcesConfig::default();
        assert_eq!(WeightTable::resolve(&sources), WeightTable::default_weights());

        sources.fetch_stablecoin_issuance = true;
        sources.weights.insert(SourceId::EtfFlows, dec!(0.4));
        sources.weights.insert(SourceId::CoinbasePremium, dec!(0.3));
        let table = WeightTable::resolve(&sources);
        assert_eq!(table.get(SourceId::StablecoinIssuance), dec!(0.05));
        assert_eq!(table.get(SourceId::EtfFlows), dec!(0.4));
        assert_eq!(table.get(SourceId::CoinbasePremium), dec!(0));
    }

    #[test]
    fn test_hourly_table() {
        let hourly = WeightTable::hourly();
        assert_eq!(hourly.get(SourceId::Price1hMomentum), dec!(0.35));
        assert_eq!(hourly.get(SourceId::EtfFlows), dec!(0));
        assert_eq!(hourly.total(), dec!(1.00));
        assert_eq!(WeightTable::default_weights().total(), dec!(1.00));
    }
}
