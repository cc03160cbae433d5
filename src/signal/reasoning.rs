//! Factor contributions and the one-line summary

use super::{FactorContribution, Reasoning, WeightTable};
use crate::fetch::{FeatureSnapshot, SourceId};
use rust_decimal::Decimal;

const SUMMARY_FACTORS: usize = 3;

/// Weighted sources absent from the snapshot or without a score
pub fn missing_sources(snapshot: &FeatureSnapshot, weights: &WeightTable) -> Vec<SourceId> {
    weights
        .iter()
        .filter(|(_, weight)| *weight > Decimal::ZERO)
        .filter(|(source, _)| !snapshot.get(*source).is_some_and(|r| r.has_score()))
        .map(|(source, _)| source)
        .collect()
}

fn signed(value: Decimal) -> String {
    let value = value.round_dp(2);
    let sign = if value.is_sign_negative() { "" } else { "+" };
    format!("{sign}{:.2}", value)
}

fn summarize(factors: &[FactorContribution], missing: &[SourceId]) -> String {
    let mut ranked: Vec<(SourceId, Decimal)> = factors
        .iter()
        .filter_map(|f| f.contribution.map(|c| (f.factor, c)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let list = |items: &[(SourceId, Decimal)]| {
        items
            .iter()
            .map(|(source, c)| format!("{source}({})", signed(*c)))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut parts = Vec::new();
    if !ranked.is_empty() {
        let top = &ranked[..ranked.len().min(SUMMARY_FACTORS)];
        parts.push(format!("Strong: {}", list(top)));
    }
    if ranked.len() > SUMMARY_FACTORS {
        let bottom = &ranked[ranked.len() - SUMMARY_FACTORS..];
        parts.push(format!("Weak: {}", list(bottom)));
    }
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(SourceId::as_str).collect();
        parts.push(format!("Missing: {}", names.join(", ")));
    }

    if parts.is_empty() {
        "No factors".to_string()
    } else {
        parts.join("; ")
    }
}

/// Per-source breakdown using the weights the score was computed with
pub fn build_reasoning(snapshot: &FeatureSnapshot, weights: &WeightTable) -> Reasoning {
    let factors: Vec<FactorContribution> = snapshot
        .results
        .values()
        .map(|r| {
            let weight = weights.get(r.source_id);
            FactorContribution {
                factor: r.source_id,
                raw_value: r.raw_value.clone(),
                weight,
                contribution: r.normalized_score.map(|s| (s * weight).round_dp(4)),
                stale: r.stale,
                error: r.error.clone(),
            }
        })
        .collect();
    let missing = missing_sources(snapshot, weights);
    let summary = summarize(&factors, &missing);

    Reasoning {
        factors,
        missing,
        summary,
    }
}
