//! Fetch result and snapshot types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Circuit breaker is open for the source; no call was made
pub const CIRCUIT_OPEN: &str = "circuit_open";
/// Upstream value failed the sanity bounds check
pub const OUT_OF_RANGE: &str = "out_of_range";
/// Payload too short or structurally unusable
pub const INSUFFICIENT_DATA: &str = "insufficient_data";
/// Fewer klines than the computation needs
pub const INSUFFICIENT_KLINES: &str = "insufficient_klines";
/// Upstream returned no rows
pub const NO_DATA: &str = "no_data";
/// Upstream rows carried no 24h change field
pub const NO_24H_CHANGE: &str = "no_24h_change";
/// Neither funding venue produced a rate
pub const NO_FUNDING_DATA: &str = "no_funding_data";
/// Source needs an API key that is not configured
pub const NO_API_KEY: &str = "no_api_key";
/// ETF flows endpoint is not configured or not http(s)
pub const INVALID_ETF_FLOWS_URL: &str = "invalid_etf_flows_url";
/// Task exceeded the snapshot deadline
pub const TIMEOUT: &str = "timeout";

/// Stable identifier for an external indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Spot BTC ETF net flows
    EtfFlows,
    /// Perpetual funding rate
    Funding,
    /// US dollar index 5-day trend
    Dxy,
    /// Crypto fear & greed index
    FearGreed,
    /// Price vs 50-day moving average
    PriceMa,
    /// Exchange BTC net flow
    ExchangeNetflow,
    /// FOMC/CPI calendar proximity
    Macro,
    /// Coinbase vs Binance premium (optional)
    CoinbasePremium,
    /// Stablecoin supply growth (optional)
    StablecoinIssuance,
    /// Last closed 1h candle return (short horizon only)
    Price1hMomentum,
}

impl SourceId {
    /// Every known source, in display order
    pub const ALL: [SourceId; 10] = [
        SourceId::EtfFlows,
        SourceId::Funding,
        SourceId::Dxy,
        SourceId::FearGreed,
        SourceId::PriceMa,
        SourceId::ExchangeNetflow,
        SourceId::Macro,
        SourceId::CoinbasePremium,
        SourceId::StablecoinIssuance,
        SourceId::Price1hMomentum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::EtfFlows => "etf_flows",
            SourceId::Funding => "funding",
            SourceId::Dxy => "dxy",
            SourceId::FearGreed => "fear_greed",
            SourceId::PriceMa => "price_ma",
            SourceId::ExchangeNetflow => "exchange_netflow",
            SourceId::Macro => "macro",
            SourceId::CoinbasePremium => "coinbase_premium",
            SourceId::StablecoinIssuance => "stablecoin_issuance",
            SourceId::Price1hMomentum => "price_1h_momentum",
        }
    }

    /// Environment variable that overrides this source's weight
    pub fn weight_env_var(&self) -> String {
        format!("WEIGHT_{}", self.as_str().to_uppercase())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown source identifier
#[derive(Debug, Error)]
#[error("unknown source id: {0}")]
pub struct UnknownSource(pub String);

impl FromStr for SourceId {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownSource(s.to_string()))
    }
}

/// One source's outcome for a single fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub source_id: SourceId,
    /// Human-readable upstream value
    pub raw_value: Option<String>,
    /// Score in [-2, 2]; None means no usable signal
    pub normalized_score: Option<Decimal>,
    /// Upstream data is older than the source's freshness budget
    pub stale: bool,
    /// Failure reason
    pub error: Option<String>,
}

impl FetchResult {
    /// A usable score
    pub fn scored(
        source_id: SourceId,
        raw_value: impl Into<String>,
        score: Decimal,
        stale: bool,
    ) -> Self {
        Self {
            source_id,
            raw_value: Some(raw_value.into()),
            normalized_score: Some(score),
            stale,
            error: None,
        }
    }

    /// A failure with no raw value
    pub fn failed(source_id: SourceId, error: impl Into<String>) -> Self {
        Self {
            source_id,
            raw_value: None,
            normalized_score: None,
            stale: false,
            error: Some(error.into()),
        }
    }

    /// A failure that still reports what upstream sent
    pub fn rejected(source_id: SourceId, raw_value: impl Into<String>, error: &str) -> Self {
        Self {
            raw_value: Some(raw_value.into()),
            ..Self::failed(source_id, error)
        }
    }

    /// Attach an error to an otherwise scored result (neutral fallbacks)
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// True when the result carries a score
    pub fn has_score(&self) -> bool {
        self.normalized_score.is_some()
    }
}

/// Results of one orchestration pass keyed by source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    /// Per-source results; order independent of completion order
    pub results: BTreeMap<SourceId, FetchResult>,
    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
}

impl FeatureSnapshot {
    /// Build a snapshot stamped now
    pub fn new(results: impl IntoIterator<Item = FetchResult>) -> Self {
        Self::at(results, Utc::now())
    }

    /// Build a snapshot with an explicit capture time
    pub fn at(results: impl IntoIterator<Item = FetchResult>, captured_at: DateTime<Utc>) -> Self {
        Self {
            results: results.into_iter().map(|r| (r.source_id, r)).collect(),
            captured_at,
        }
    }

    pub fn get(&self, source: SourceId) -> Option<&FetchResult> {
        self.results.get(&source)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of results with a usable score
    pub fn scored_count(&self) -> usize {
        self.results.values().filter(|r| r.has_score()).count()
    }
}

/// Transport or decode failure raised by a fetcher
///
/// Data-quality problems are not errors: fetchers return them as a
/// [`FetchResult`] carrying an error code.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout, or body read failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    /// HTTP 451, the venue blocks this region
    #[error("HTTP 451 (region blocked) from {0}")]
    RegionBlocked(String),
    /// HTTP 429
    #[error("HTTP 429 (rate limited) from {0}")]
    RateLimited(String),
    /// Payload could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether another attempt might succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::RegionBlocked(_) | FetchError::Decode(_))
    }
}
