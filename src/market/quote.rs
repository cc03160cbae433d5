//! Market quotes derived from CLOB order books

use crate::orderbook::{BookSide, OrderBook};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Yes-side quote for a binary market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub best_bid: Option<Decimal>,
    pub best_ask: Decimal,
    pub spread: Option<Decimal>,
    /// Market implied probability of Yes (the best ask)
    pub implied_prob_yes: Decimal,
    /// Notional fillable on the ask side within the slippage limit
    pub max_safe_size_usd: Decimal,
}

impl MarketQuote {
    /// Quote from explicit prices
    pub fn new(best_bid: Option<Decimal>, best_ask: Decimal, max_safe_size_usd: Decimal) -> Self {
        Self {
            best_bid,
            best_ask,
            spread: best_bid.map(|bid| (best_ask - bid).round_dp(4)),
            implied_prob_yes: best_ask,
            max_safe_size_usd,
        }
    }

    /// Quote from the Yes token's book; None when there are no asks
    pub fn from_book(book: &OrderBook, slippage_limit: Decimal) -> Option<Self> {
        let best_ask = book.best_ask()?;
        let mut quote = Self::new(
            book.best_bid(),
            best_ask,
            book.max_safe_size(BookSide::Ask, slippage_limit),
        );
        quote.spread = book.spread();
        Some(quote)
    }
}

/// Paired quote for a 15-minute Up/Down market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpDownQuote {
    pub up_buy_price: Decimal,
    pub down_buy_price: Decimal,
    /// Up price normalized so both sides sum to one
    pub market_up_norm: Decimal,
    pub market_down_norm: Decimal,
    pub max_safe_up_usd: Decimal,
    pub max_safe_down_usd: Decimal,
    pub up_spread: Option<Decimal>,
    pub down_spread: Option<Decimal>,
}

impl UpDownQuote {
    /// Quote from explicit buy prices and depths
    pub fn from_prices(
        up_buy_price: Decimal,
        down_buy_price: Decimal,
        max_safe_up_usd: Decimal,
        max_safe_down_usd: Decimal,
    ) -> Self {
        let total = up_buy_price + down_buy_price;
        let (market_up_norm, market_down_norm) = if total > Decimal::ZERO {
            let up = up_buy_price / total;
            (up, Decimal::ONE - up)
        } else {
            (dec!(0.5), dec!(0.5))
        };

        Self {
            up_buy_price,
            down_buy_price,
            market_up_norm,
            market_down_norm,
            max_safe_up_usd,
            max_safe_down_usd,
            up_spread: None,
            down_spread: None,
        }
    }

    /// Quote from the Up and Down books, buying at each best ask
    pub fn from_books(up: &OrderBook, down: &OrderBook, slippage_limit: Decimal) -> Option<Self> {
        let mut quote = Self::from_prices(
            up.best_ask()?,
            down.best_ask()?,
            up.max_safe_size(BookSide::Ask, slippage_limit),
            down.max_safe_size(BookSide::Ask, slippage_limit),
        );
        quote.up_spread = up.spread();
        quote.down_spread = down.spread();
        Some(quote)
    }
}
