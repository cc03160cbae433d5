//! Order book module
//!
//! Order book snapshots from the Polymarket CLOB and liquidity depth

mod book;
mod snapshot;

pub use book::{slippage_bps, OrderBook};
pub use snapshot::{parse_order_book, BookError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price level in the order book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Price at this level
    pub price: Decimal,
    /// Total size available
    pub size: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

/// Side of the book an order consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    /// Resting sells, consumed by a buy
    Ask,
    /// Resting buys, consumed by a sell
    Bid,
}
