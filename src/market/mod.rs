//! Market module
//!
//! Market identity, horizon classification, and quotes consumed by the engines

mod clob;
mod horizon;
mod quote;

pub use clob::{ClobClient, DEFAULT_CLOB_URL};
pub use horizon::MarketHorizon;
pub use quote::{MarketQuote, UpDownQuote};

use crate::orderbook::OrderBook;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A Polymarket binary market, as chosen by the market-selection collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Market slug
    pub slug: String,
    /// Unique condition identifier
    pub condition_id: Option<String>,
    /// Yes / Up token identifier
    pub yes_token_id: Option<String>,
    /// No / Down token identifier
    pub no_token_id: Option<String>,
    /// Market close/settlement time
    pub close_time: Option<DateTime<Utc>>,
}

impl Market {
    /// A market known only by slug
    pub fn from_slug(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            condition_id: None,
            yes_token_id: None,
            no_token_id: None,
            close_time: None,
        }
    }

    pub fn horizon(&self) -> MarketHorizon {
        MarketHorizon::classify(&self.slug)
    }

    /// Minutes until close; negative once closed, None when unknown
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> Option<f64> {
        self.close_time
            .map(|close| (close - now).num_milliseconds() as f64 / 60_000.0)
    }
}

/// Source of order books and quotes for the engines
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Current order book for a token
    async fn order_book(&self, token_id: &str) -> anyhow::Result<OrderBook>;

    /// Yes-side quote for a binary market
    async fn market_quote(&self, yes_token_id: &str, slippage_limit: Decimal) -> anyhow::Result<MarketQuote> {
        let book = self.order_book(yes_token_id).await?;
        MarketQuote::from_book(&book, slippage_limit)
            .ok_or_else(|| anyhow::anyhow!("order book for {} has no asks", yes_token_id))
    }

    /// Paired quote for an Up/Down market, priced from both ask sides
    async fn up_down_quote(
        &self,
        up_token_id: &str,
        down_token_id: &str,
        slippage_limit: Decimal,
    ) -> anyhow::Result<UpDownQuote> {
        let up = self.order_book(up_token_id).await?;
        let down = self.order_book(down_token_id).await?;
        UpDownQuote::from_books(&up, &down, slippage_limit)
            .ok_or_else(|| anyhow::anyhow!("up/down books have no asks"))
    }
}
