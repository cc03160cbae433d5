//! CLOB REST order book parsing

use super::{OrderBook, PriceLevel};
use crate::fetch::{decimal_from_value, timestamp_from_value};
use serde_json::Value;
use thiserror::Error;

/// Malformed order book payload
#[derive(Debug, Error)]
pub enum BookError {
    #[error("order book payload is not an object")]
    NotAnObject,
    #[error("invalid level in {side}: {level}")]
    InvalidLevel { side: &'static str, level: String },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn parse_levels(payload: &Value, side: &'static str) -> Result<Vec<PriceLevel>, BookError> {
    let Some(rows) = payload.get(side).and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    rows.iter()
        .map(|row| {
            let price = row.get("price").and_then(decimal_from_value);
            let size = row.get("size").and_then(decimal_from_value);
            match (price, size) {
                (Some(price), Some(size)) => Ok(PriceLevel { price, size }),
                _ => Err(BookError::InvalidLevel {
                    side,
                    level: row.to_string(),
                }),
            }
        })
        .collect()
}

/// Parse a `GET /book` response; prices and sizes may be strings or numbers
pub fn parse_order_book(payload: &Value) -> Result<OrderBook, BookError> {
    if !payload.is_object() {
        return Err(BookError::NotAnObject);
    }
    let token_id = payload
        .get("asset_id")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut book = OrderBook::from_levels(
        token_id,
        parse_levels(payload, "bids")?,
        parse_levels(payload, "asks")?,
    );
    if let Some(ts) = payload.get("timestamp").and_then(timestamp_from_value) {
        book.updated_at = ts;
    }
    Ok(book)
}

impl std::str::FromStr for OrderBook {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let payload: Value = serde_json::from_str(s)?;
        parse_order_book(&payload)
    }
}
