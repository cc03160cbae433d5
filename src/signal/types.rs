//! Signal types

use crate::fetch::SourceId;
use crate::market::Market;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Trade decision for a Yes/No market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Buy Yes tokens
    Yes,
    /// Buy No tokens
    No,
    NoTrade,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Yes => "YES",
            Direction::No => "NO",
            Direction::NoTrade => "NO_TRADE",
        }
    }

    pub fn is_trade(&self) -> bool {
        !matches!(self, Direction::NoTrade)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source's part in the composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: SourceId,
    pub raw_value: Option<String>,
    pub weight: Decimal,
    /// score * weight, rounded to 4 decimals; None without a score
    pub contribution: Option<Decimal>,
    pub stale: bool,
    pub error: Option<String>,
}

/// Per-factor breakdown with a one-line summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reasoning {
    pub factors: Vec<FactorContribution>,
    /// Weighted sources that produced no score
    pub missing: Vec<SourceId>,
    pub summary: String,
}

/// Long-horizon engine output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalResult {
    pub id: Uuid,
    pub market_slug: Option<String>,
    pub market_condition_id: Option<String>,
    pub direction: Direction,
    /// Composite score in [-2, 2]
    pub composite_score: Decimal,
    pub model_p: Decimal,
    /// Implied Yes probability (best ask)
    pub market_p: Decimal,
    /// Edge of the chosen side; Yes edge when not trading
    pub edge: Decimal,
    pub edge_yes: Decimal,
    pub edge_no: Option<Decimal>,
    /// Full-Kelly fraction for the chosen side
    pub kelly_fraction: Decimal,
    pub recommended_usd: Decimal,
    pub max_safe_size_usd: Decimal,
    pub reasoning: Reasoning,
    pub liquidity_warning: Option<String>,
    /// Caller's stake cap, echoed for display
    pub user_bet_cap_usd: Option<Decimal>,
    /// Kelly multiplier override, echoed for display
    pub kelly_fraction_used: Option<Decimal>,
    pub generated_at: DateTime<Utc>,
}

impl SignalResult {
    /// Tag the result with the market it was computed for
    pub fn for_market(mut self, market: &Market) -> Self {
        self.market_slug = Some(market.slug.clone());
        self.market_condition_id = market.condition_id.clone();
        self
    }
}
