//! Market horizon classification from the slug

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Time horizon of a market, which selects the fetcher set and weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketHorizon {
    /// Daily markets: macro, flow, and sentiment sources
    Daily,
    /// Hourly BTC Up/Down markets
    Hourly,
    /// 15-minute BTC Up/Down markets
    FifteenMinute,
}

fn up_down_patterns() -> &'static RegexSet {
    static PATTERNS: OnceLock<RegexSet> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        RegexSet::new([
            r"(?i)bitcoin.*up.*down",
            r"(?i)bitcoin.*up\s*or\s*down",
            r"(?i)btc.*up.*down",
            r"(?i)btc.*up\s*or\s*down",
        ])
        .expect("static up/down patterns")
    })
}

fn fifteen_minute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(btc|bitcoin).*(15m|15-min)").expect("static 15m pattern"))
}

impl MarketHorizon {
    /// Classify a market slug; 15-minute slugs also look hourly, so they are checked first
    pub fn classify(slug: &str) -> Self {
        if fifteen_minute_pattern().is_match(slug) {
            MarketHorizon::FifteenMinute
        } else if up_down_patterns().is_match(slug) {
            MarketHorizon::Hourly
        } else {
            MarketHorizon::Daily
        }
    }

    /// Hourly and 15-minute markets use the momentum fetcher and hourly weights
    pub fn is_short(&self) -> bool {
        !matches!(self, MarketHorizon::Daily)
    }
}
