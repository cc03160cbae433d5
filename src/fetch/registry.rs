//! Enabled fetcher set, resolved once from configuration

use super::{
    CoinbasePremiumFetcher, DxyFetcher, EtfFlowsFetcher, ExchangeNetflowFetcher, FearGreedFetcher, FetchError,
    FundingFetcher, HttpClient, MacroFetcher, MomentumFetcher, PriceMaFetcher, SourceFetcher,
    StablecoinIssuanceFetcher,
};
use crate::config::Config;
use std::sync::Arc;

/// Fetchers for both horizons
#[derive(Clone)]
pub struct FetcherRegistry {
    base: Vec<Arc<dyn SourceFetcher>>,
    momentum: Arc<dyn SourceFetcher>,
}

impl FetcherRegistry {
    /// Explicit fetcher sets
    pub fn new(base: Vec<Arc<dyn SourceFetcher>>, momentum: Arc<dyn SourceFetcher>) -> Self {
        Self { base, momentum }
    }

    /// Core fetchers, optional fetchers whose flags are set, and the momentum fetcher
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let http = HttpClient::new(config.fetch.timeout())?;
        let endpoints = &config.endpoints;
        let sources = &config.sources;

        let mut base: Vec<Arc<dyn SourceFetcher>> = vec![
            Arc::new(EtfFlowsFetcher::new(http.clone(), &endpoints.etf_flows)),
            Arc::new(FundingFetcher::new(
                http.clone(),
                &endpoints.binance_futures,
                &endpoints.bybit,
            )),
            Arc::new(DxyFetcher::new(http.clone(), &endpoints.dxy)),
            Arc::new(FearGreedFetcher::new(http.clone(), &endpoints.fear_greed)),
            Arc::new(PriceMaFetcher::new(
                http.clone(),
                &endpoints.binance_spot,
                &endpoints.coingecko,
            )),
            Arc::new(ExchangeNetflowFetcher),
            Arc::new(MacroFetcher::new(
                http.clone(),
                &endpoints.fmp_calendar,
                sources.fmp_api_key.clone(),
            )),
        ];
        if sources.fetch_coinbase_premium {
            base.push(Arc::new(CoinbasePremiumFetcher));
        }
        if sources.fetch_stablecoin_issuance {
            base.push(Arc::new(StablecoinIssuanceFetcher::new(http.clone(), &endpoints.coingecko)));
        }

        let momentum = Arc::new(MomentumFetcher::new(http, &endpoints.binance_spot));
        Ok(Self::new(base, momentum))
    }

    /// Fetchers for daily markets
    pub fn long_horizon(&self) -> Vec<Arc<dyn SourceFetcher>> {
        self.base.clone()
    }

    /// Daily fetchers plus 1h momentum, for hourly and 15-minute markets
    pub fn short_horizon(&self) -> Vec<Arc<dyn SourceFetcher>> {
        let mut fetchers = self.base.clone();
        fetchers.push(Arc::clone(&self.momentum));
        fetchers
    }
}
