//! Sources command implementation

use super::{print_json, OutputFormat};
use crate::config::Config;
use crate::fetch::{FeatureSnapshot, FetchOrchestrator};
use crate::market::Market;
use crate::signal::{weighted_score, WeightTable};
use clap::Args;

#[derive(Args, Debug)]
pub struct SourcesArgs {
    /// Use the fetcher set and weights for this market's horizon
    #[arg(long)]
    pub slug: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl SourcesArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let orchestrator = FetchOrchestrator::from_config(config)?;
        let (snapshot, weights) = match &self.slug {
            Some(slug) => orchestrator.run_fetchers_for_market(&Market::from_slug(slug)).await,
            None => (orchestrator.run_all_fetchers().await, orchestrator.weights().clone()),
        };

        match self.format {
            OutputFormat::Json => print_json(&snapshot)?,
            OutputFormat::Table => print!("{}", format_snapshot(&snapshot, &weights)),
        }
        Ok(())
    }
}

fn format_snapshot(snapshot: &FeatureSnapshot, weights: &WeightTable) -> String {
    let mut out = format!(
        "\n{:<20} {:>14} {:>7} {:>6}  {}\n",
        "SOURCE", "RAW", "SCORE", "WEIGHT", "STATUS"
    );
    out.push_str("───────────────────────────────────────────────────────────────\n");
    for r in snapshot.results.values() {
        let score = r
            .normalized_score
            .map(|s| format!("{s:+.2}"))
            .unwrap_or_else(|| "-".to_string());
        let status = match (&r.error, r.stale) {
            (Some(e), _) => e.clone(),
            (None, true) => "stale".to_string(),
            (None, false) => "ok".to_string(),
        };
        out.push_str(&format!(
            "{:<20} {:>14} {:>7} {:>6.2}  {status}\n",
            r.source_id.as_str(),
            r.raw_value.as_deref().unwrap_or("-"),
            score,
            weights.get(r.source_id),
        ));
    }
    out.push_str(&format!(
        "\nScored {}/{}  Composite {:+.4}  Captured {}\n",
        snapshot.scored_count(),
        snapshot.len(),
        weighted_score(snapshot.results.values(), weights),
        snapshot.captured_at.format("%Y-%m-%d %H:%M:%S UTC"),
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchResult, SourceId};
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_snapshot() {
        let snapshot = FeatureSnapshot::new(vec![
            FetchResult::scored(SourceId::FearGreed, "22", dec!(2), true),
            FetchResult::failed(SourceId::Funding, "timeout"),
        ]);
        let table = format_snapshot(&snapshot, &WeightTable::default());
        assert!(table.contains("fear_greed"));
        assert!(table.contains("stale"));
        assert!(table.contains("timeout"));
        assert!(table.contains("Scored 1/2"));
    }
}
