//! Order book state and liquidity depth

use super::{BookSide, PriceLevel};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// L2 aggregated order book for a token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    /// Token identifier
    pub token_id: String,
    /// Bid levels, sorted best (highest) to worst
    pub bids: Vec<PriceLevel>,
    /// Ask levels, sorted best (lowest) to worst
    pub asks: Vec<PriceLevel>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            bids: vec![],
            asks: vec![],
            updated_at: Utc::now(),
        }
    }

    /// Build a book from unsorted levels
    pub fn from_levels(token_id: impl Into<String>, bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> Self {
        let mut book = Self::new(token_id);
        book.bids = bids;
        book.asks = asks;
        book.sort_levels();
        book
    }

    /// Sort bids descending and asks ascending
    pub fn sort_levels(&mut self) {
        self.bids.sort_by(|a, b| b.price.cmp(&a.price));
        self.asks.sort_by(|a, b| a.price.cmp(&b.price));
    }

    /// Get best bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    /// Get best ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }

    /// Get spread, rounded to 4 decimals
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((ask - bid).round_dp(4)),
            _ => None,
        }
    }

    fn side(&self, side: BookSide) -> &[PriceLevel] {
        match side {
            BookSide::Ask => &self.asks,
            BookSide::Bid => &self.bids,
        }
    }

    /// Largest notional fillable before average-price slippage exceeds `limit`
    ///
    /// Walks levels from the best price outward and stops before the first
    /// level that would push slippage past the limit. Result in quote
    /// currency, rounded to cents.
    pub fn max_safe_size(&self, side: BookSide, limit: Decimal) -> Decimal {
        let levels = self.side(side);
        let Some(best) = levels.first().map(|l| l.price) else {
            return Decimal::ZERO;
        };
        if best <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let mut cumulative_cost = Decimal::ZERO;
        let mut cumulative_qty = Decimal::ZERO;
        for level in levels {
            let qty = cumulative_qty + level.size;
            let cost = cumulative_cost + level.price * level.size;
            let avg_price = if qty > Decimal::ZERO { cost / qty } else { level.price };
            let slippage = match side {
                BookSide::Ask => (avg_price - best) / best,
                BookSide::Bid => (best - avg_price) / best,
            };
            if slippage > limit {
                break;
            }
            cumulative_cost = cost;
            cumulative_qty = qty;
        }

        cumulative_cost.round_dp(2)
    }

    /// Volume-weighted fill price for spending `notional` against one side
    ///
    /// None when the book cannot absorb the full notional.
    pub fn vwap_for_notional(&self, side: BookSide, notional: Decimal) -> Option<Decimal> {
        if notional <= Decimal::ZERO {
            return None;
        }
        let mut remaining = notional;
        let mut qty = Decimal::ZERO;
        for level in self.side(side) {
            if level.price <= Decimal::ZERO {
                continue;
            }
            let level_notional = level.price * level.size;
            if level_notional >= remaining {
                qty += remaining / level.price;
                remaining = Decimal::ZERO;
                break;
            }
            qty += level.size;
            remaining -= level_notional;
        }
        if remaining > Decimal::ZERO || qty.is_zero() {
            return None;
        }
        Some(notional / qty)
    }
}

/// Slippage of a fill versus the quoted price, in basis points
pub fn slippage_bps(quoted: Decimal, filled: Decimal) -> Option<Decimal> {
    if quoted <= Decimal::ZERO {
        return None;
    }
    Some(((filled - quoted) / quoted * dec!(10000)).round_dp(2))
}
