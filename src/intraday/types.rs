//! Intraday signal types

use super::indicators::HaColor;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Trade decision for a 15-minute Up/Down market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction15m {
    BuyUp,
    BuyDown,
    NoTrade,
}

impl Direction15m {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction15m::BuyUp => "BUY_UP",
            Direction15m::BuyDown => "BUY_DOWN",
            Direction15m::NoTrade => "NO_TRADE",
        }
    }
}

impl fmt::Display for Direction15m {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-remaining bucket; thresholds tighten as the window closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// More than 10 minutes left
    Early,
    /// More than 5, up to 10 minutes left
    Mid,
    /// 5 minutes or less
    Late,
}

impl Phase {
    /// Unknown remaining time is treated as 10 minutes
    pub fn from_remaining(remaining_minutes: Option<f64>) -> Self {
        let rem = remaining_minutes.unwrap_or(10.0);
        if rem > 10.0 {
            Phase::Early
        } else if rem > 5.0 {
            Phase::Mid
        } else {
            Phase::Late
        }
    }

    pub fn edge_threshold(&self) -> Decimal {
        match self {
            Phase::Early => dec!(0.05),
            Phase::Mid => dec!(0.10),
            Phase::Late => dec!(0.20),
        }
    }

    /// Minimum model probability for the chosen side
    pub fn min_probability(&self) -> Decimal {
        match self {
            Phase::Early => dec!(0.55),
            Phase::Mid => dec!(0.60),
            Phase::Late => dec!(0.65),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Early => "EARLY",
            Phase::Mid => "MID",
            Phase::Late => "LATE",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator readings at the last bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub last_price: f64,
    pub vwap: Option<f64>,
    pub vwap_slope: Option<f64>,
    pub rsi: Option<f64>,
    pub rsi_slope: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub ha_color: Option<HaColor>,
    /// Consecutive Heiken-Ashi bars of the last color
    pub ha_run: usize,
    pub failed_vwap_reclaim: bool,
}

/// Intraday engine output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal15mResult {
    pub id: Uuid,
    pub direction: Direction15m,
    /// TA probability of Up before time decay
    pub raw_up: Option<Decimal>,
    pub model_up: Decimal,
    pub model_down: Decimal,
    pub market_up_norm: Decimal,
    pub market_down_norm: Decimal,
    pub edge_up: Option<Decimal>,
    pub edge_down: Option<Decimal>,
    pub recommended_usd: Decimal,
    pub phase: Phase,
    pub remaining_minutes: Option<f64>,
    pub indicators: Option<Indicators>,
    /// Why no indicators were computed
    pub note: Option<String>,
    pub liquidity_warning: Option<String>,
    pub generated_at: DateTime<Utc>,
}
