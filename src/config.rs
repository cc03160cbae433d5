//! Configuration types for poly-signal
//!
//! Values come from an optional TOML file, then environment variables
//! (including a `.env` file) override them. [`Config::validate`] runs once
//! at startup.

use crate::fetch::SourceId;
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Environment variable present but unparseable
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: String, value: String },
    /// Value outside its accepted range
    #[error("{name} = {value} is outside {range}")]
    OutOfRange {
        name: String,
        value: String,
        range: String,
    },
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub signal: SignalConfig,
    pub risk: RiskConfig,
    pub sources: SourcesConfig,
    pub endpoints: EndpointsConfig,
    pub telemetry: TelemetryConfig,
}

/// Fetch reliability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request HTTP timeout (seconds)
    pub timeout_secs: f64,
    /// Consecutive failed fetches before a source's circuit opens
    pub circuit_failure_threshold: u32,
    /// How long an open circuit short-circuits calls (seconds)
    pub circuit_open_secs: f64,
    /// Attempts per fetch, including the first
    pub retry_attempts: u32,
    /// Base of the exponential backoff (seconds)
    pub retry_base_delay_secs: f64,
    /// Pending fetch tasks are abandoned after this long (seconds); raised to
    /// the retry worst case when shorter
    pub snapshot_deadline_secs: f64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15.0,
            circuit_failure_threshold: 3,
            circuit_open_secs: 300.0,
            retry_attempts: 3,
            retry_base_delay_secs: 1.0,
            snapshot_deadline_secs: 90.0,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    pub fn circuit_open(&self) -> Duration {
        Duration::from_secs_f64(self.circuit_open_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_base_delay_secs)
    }

    pub fn snapshot_deadline(&self) -> Duration {
        Duration::from_secs_f64(self.snapshot_deadline_secs)
    }
}

/// Signal generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Minimum edge (probability points) to trade
    pub edge_threshold: Decimal,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            edge_threshold: dec!(0.05),
        }
    }
}

/// Risk and sizing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Fractional Kelly multiplier (0.25 = quarter Kelly)
    pub kelly_fraction: Decimal,
    /// Hard cap on a single stake as a fraction of bankroll
    pub max_bankroll_pct: Decimal,
    /// Maximum average-price slippage when walking the book
    pub slippage_limit: Decimal,
    /// Bankroll used when the caller supplies none (USD)
    pub default_bankroll_usd: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            kelly_fraction: dec!(0.25),
            max_bankroll_pct: dec!(0.05),
            slippage_limit: dec!(0.01),
            default_bankroll_usd: dec!(1000),
        }
    }
}

/// Optional fetchers, credentials, and weight overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Include the Coinbase premium fetcher
    pub fetch_coinbase_premium: bool,
    /// Include the stablecoin issuance fetcher
    pub fetch_stablecoin_issuance: bool,
    /// FMP key for the macro calendar
    pub fmp_api_key: Option<String>,
    /// Per-source overrides of the long-horizon weights
    pub weights: BTreeMap<SourceId, Decimal>,
}

/// Upstream base URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub binance_spot: String,
    pub binance_futures: String,
    pub bybit: String,
    pub coingecko: String,
    pub dxy: String,
    pub fear_greed: String,
    pub etf_flows: String,
    pub fmp_calendar: String,
    pub polymarket_clob: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        use crate::fetch::defaults;
        Self {
            binance_spot: defaults::BINANCE_SPOT_URL.to_string(),
            binance_futures: defaults::BINANCE_FUTURES_URL.to_string(),
            bybit: defaults::BYBIT_URL.to_string(),
            coingecko: defaults::COINGECKO_URL.to_string(),
            dxy: defaults::DXY_URL.to_string(),
            fear_greed: defaults::FEAR_GREED_URL.to_string(),
            etf_flows: defaults::ETF_FLOWS_URL.to_string(),
            fmp_calendar: defaults::FMP_CALENDAR_URL.to_string(),
            polymarket_clob: crate::market::DEFAULT_CLOB_URL.to_string(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Prometheus exporter port; no exporter when unset
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Reject `value` unless it lies in the range; `open_min` excludes the lower end
fn check_range<T: PartialOrd + Display>(
    name: &str,
    value: T,
    min: T,
    max: T,
    open_min: bool,
) -> Result<(), ConfigError> {
    let above_min = if open_min { value > min } else { value >= min };
    if above_min && value <= max {
        return Ok(());
    }
    Err(ConfigError::OutOfRange {
        name: name.to_string(),
        value: value.to_string(),
        range: format!("{}{min}, {max}]", if open_min { "(" } else { "[" }),
    })
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment and `.env`
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        dotenvy::dotenv().ok();
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("FETCHER_TIMEOUT") {
            self.fetch.timeout_secs = parse_env("FETCHER_TIMEOUT", &v)?;
        }
        if let Some(v) = get("CIRCUIT_FAILURE_THRESHOLD") {
            self.fetch.circuit_failure_threshold = parse_env("CIRCUIT_FAILURE_THRESHOLD", &v)?;
        }
        if let Some(v) = get("CIRCUIT_OPEN_SECONDS") {
            self.fetch.circuit_open_secs = parse_env("CIRCUIT_OPEN_SECONDS", &v)?;
        }
        if let Some(v) = get("RETRY_ATTEMPTS") {
            self.fetch.retry_attempts = parse_env("RETRY_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("RETRY_BASE_DELAY") {
            self.fetch.retry_base_delay_secs = parse_env("RETRY_BASE_DELAY", &v)?;
        }
        if let Some(v) = get("SNAPSHOT_DEADLINE_SECONDS") {
            self.fetch.snapshot_deadline_secs = parse_env("SNAPSHOT_DEADLINE_SECONDS", &v)?;
        }
        if let Some(v) = get("EDGE_THRESHOLD") {
            self.signal.edge_threshold = parse_env("EDGE_THRESHOLD", &v)?;
        }
        if let Some(v) = get("KELLY_FRACTION") {
            self.risk.kelly_fraction = parse_env("KELLY_FRACTION", &v)?;
        }
        if let Some(v) = get("MAX_BANKROLL_PCT") {
            self.risk.max_bankroll_pct = parse_env("MAX_BANKROLL_PCT", &v)?;
        }
        if let Some(v) = get("SLIPPAGE_LIMIT") {
            self.risk.slippage_limit = parse_env("SLIPPAGE_LIMIT", &v)?;
        }
        if let Some(v) = get("DEFAULT_BANKROLL_USD") {
            self.risk.default_bankroll_usd = parse_env("DEFAULT_BANKROLL_USD", &v)?;
        }
        if let Some(v) = get("FETCH_COINBASE_PREMIUM") {
            self.sources.fetch_coinbase_premium = parse_flag("FETCH_COINBASE_PREMIUM", &v)?;
        }
        if let Some(v) = get("FETCH_STABLECOIN_ISSUANCE") {
            self.sources.fetch_stablecoin_issuance = parse_flag("FETCH_STABLECOIN_ISSUANCE", &v)?;
        }
        if let Some(v) = get("FMP_API_KEY") {
            self.sources.fmp_api_key = Some(v.trim().to_string());
        }
        if let Some(v) = get("FMP_ECONOMIC_CALENDAR_URL") {
            self.endpoints.fmp_calendar = v.trim().to_string();
        }
        if let Some(v) = get("ETF_FLOWS_URL") {
            self.endpoints.etf_flows = v.trim().to_string();
        }
        for source in SourceId::ALL {
            let key = source.weight_env_var();
            if let Some(v) = get(&key) {
                self.sources.weights.insert(source, parse_env(&key, &v)?);
            }
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.telemetry.log_level = v.trim().to_string();
        }
        if let Some(v) = get("LOG_FORMAT") {
            self.telemetry.log_format = parse_env("LOG_FORMAT", &v)?;
        }
        if let Some(v) = get("METRICS_PORT") {
            self.telemetry.metrics_port = Some(parse_env("METRICS_PORT", &v)?);
        }
        Ok(())
    }

    /// Check every bounded setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.fetch;
        check_range("fetch.timeout_secs", f.timeout_secs, 0.0, 120.0, true)?;
        check_range("fetch.circuit_failure_threshold", f.circuit_failure_threshold, 1, 20, false)?;
        check_range("fetch.circuit_open_secs", f.circuit_open_secs, 0.0, 3600.0, true)?;
        check_range("fetch.retry_attempts", f.retry_attempts, 1, 10, false)?;
        check_range("fetch.retry_base_delay_secs", f.retry_base_delay_secs, 0.0, 30.0, true)?;
        check_range("fetch.snapshot_deadline_secs", f.snapshot_deadline_secs, 0.0, 3600.0, true)?;

        let unit = (Decimal::ZERO, Decimal::ONE);
        check_range("signal.edge_threshold", self.signal.edge_threshold, unit.0, unit.1, false)?;
        check_range("risk.kelly_fraction", self.risk.kelly_fraction, unit.0, unit.1, false)?;
        check_range("risk.max_bankroll_pct", self.risk.max_bankroll_pct, unit.0, unit.1, false)?;
        check_range("risk.slippage_limit", self.risk.slippage_limit, Decimal::ZERO, dec!(0.1), false)?;
        if self.risk.default_bankroll_usd <= Decimal::ZERO {
            return Err(ConfigError::OutOfRange {
                name: "risk.default_bankroll_usd".to_string(),
                value: self.risk.default_bankroll_usd.to_string(),
                range: "(0, inf)".to_string(),
            });
        }
        for (source, weight) in &self.sources.weights {
            check_range(&format!("sources.weights.{source}"), *weight, unit.0, unit.1, false)?;
        }
        Ok(())
    }
}
