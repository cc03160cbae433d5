//! Source fetcher module
//!
//! One fetcher per external indicator, the reliability-wrapped orchestrator
//! that runs them concurrently, and the shared HTTP and kline plumbing.

mod bounds;
mod coinbase_premium;
mod dxy;
mod etf_flows;
mod exchange_netflow;
mod fear_greed;
mod funding;
mod http;
mod klines;
mod macro_calendar;
mod momentum;
mod orchestrator;
mod price_ma;
mod registry;
mod stablecoin;
mod types;

pub use bounds::{bounds_for, is_stale, max_age, within_bounds, Bounds};
pub use coinbase_premium::CoinbasePremiumFetcher;
pub use dxy::DxyFetcher;
pub use etf_flows::EtfFlowsFetcher;
pub use exchange_netflow::ExchangeNetflowFetcher;
pub use fear_greed::FearGreedFetcher;
pub use funding::FundingFetcher;
pub use http::{decimal_from_value, f64_from_value, timestamp_from_epoch, timestamp_from_value, HttpClient};
pub use klines::{fetch_klines, fetch_klines_1m, parse_klines, Candle};
pub use macro_calendar::{high_impact_event_ahead, MacroFetcher};
pub use momentum::MomentumFetcher;
pub use orchestrator::FetchOrchestrator;
pub use price_ma::PriceMaFetcher;
pub use registry::FetcherRegistry;
pub use stablecoin::StablecoinIssuanceFetcher;
pub use types::{
    FeatureSnapshot, FetchError, FetchResult, SourceId, UnknownSource, CIRCUIT_OPEN, INSUFFICIENT_DATA,
    INSUFFICIENT_KLINES, INVALID_ETF_FLOWS_URL, NO_24H_CHANGE, NO_API_KEY, NO_DATA, NO_FUNDING_DATA,
    OUT_OF_RANGE, TIMEOUT,
};

use async_trait::async_trait;

/// Default upstream endpoints
pub mod defaults {
    pub use super::dxy::DEFAULT_DXY_URL as DXY_URL;
    pub use super::etf_flows::DEFAULT_ETF_FLOWS_URL as ETF_FLOWS_URL;
    pub use super::fear_greed::DEFAULT_FEAR_GREED_URL as FEAR_GREED_URL;
    pub use super::funding::{DEFAULT_BINANCE_FUTURES_URL as BINANCE_FUTURES_URL, DEFAULT_BYBIT_URL as BYBIT_URL};
    pub use super::macro_calendar::DEFAULT_FMP_CALENDAR_URL as FMP_CALENDAR_URL;
    pub use super::price_ma::{DEFAULT_BINANCE_SPOT_URL as BINANCE_SPOT_URL, DEFAULT_COINGECKO_URL as COINGECKO_URL};
}

/// One external indicator
///
/// `fetch` returns `Err` only for transport and decode failures, which the
/// reliability wrapper retries. Data-quality problems come back as an `Ok`
/// result carrying an error code.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Stable identifier of this source
    fn source_id(&self) -> SourceId;

    /// Fetch, bounds-check, and normalize once
    async fn fetch(&self) -> Result<FetchResult, FetchError>;
}
