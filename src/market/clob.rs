//! Polymarket CLOB REST quote provider

use super::QuoteProvider;
use crate::fetch::HttpClient;
use crate::orderbook::{parse_order_book, OrderBook};
use async_trait::async_trait;
use std::time::Duration;

/// CLOB REST API base URL
pub const DEFAULT_CLOB_URL: &str = "https://clob.polymarket.com";

/// Reads order books from the CLOB `GET /book` endpoint
pub struct ClobClient {
    http: HttpClient,
    base_url: String,
}

impl ClobClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl QuoteProvider for ClobClient {
    async fn order_book(&self, token_id: &str) -> anyhow::Result<OrderBook> {
        let url = format!("{}/book", self.base_url);
        let payload = self
            .http
            .get_json(&url, &[("token_id", token_id.to_string())])
            .await?;
        let mut book = parse_order_book(&payload)?;
        if book.token_id.is_empty() {
            book.token_id = token_id.to_string();
        }
        tracing::debug!(
            token_id = %token_id,
            bids = book.bids.len(),
            asks = book.asks.len(),
            "order_book_fetched"
        );
        Ok(book)
    }
}
