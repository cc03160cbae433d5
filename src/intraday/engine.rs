//! Intraday engine for 15-minute Up/Down markets
//!
//! 1-minute candles -> indicator votes -> raw Up probability -> decay toward
//! 0.5 as the window closes -> phase-aware edge gate -> Kelly stake.

use super::indicators::{
    failed_vwap_reclaim, heiken_ashi_color, heiken_ashi_run, macd, rsi, rsi_series, session_vwap, slope,
    vwap_series, HaColor,
};
use super::{Direction15m, Indicators, Phase, Signal15mResult};
use crate::config::RiskConfig;
use crate::fetch::Candle;
use crate::market::UpDownQuote;
use crate::risk::KellySizer;
use crate::signal::THIN_LIQUIDITY_USD;
use crate::telemetry;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

pub const RSI_PERIOD: usize = 14;
const RSI_SLOPE_BARS: usize = 3;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const VWAP_SLOPE_LOOKBACK: usize = 5;
/// Market window length in minutes
pub const WINDOW_MINUTES: f64 = 15.0;
/// Bars needed before any indicator is trusted
pub const MIN_CANDLES: usize = RSI_PERIOD + 10;

const INSUFFICIENT_KLINES_NOTE: &str = "Insufficient 1m klines";

/// Compute indicator readings for the last bar
pub fn compute_indicators(candles: &[Candle]) -> Option<Indicators> {
    let last = candles.last()?;
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let vwap = session_vwap(candles);
    let vwaps = vwap_series(candles);

    let vwap_slope = (vwaps.len() >= VWAP_SLOPE_LOOKBACK)
        .then(|| (vwaps[vwaps.len() - 1] - vwaps[vwaps.len() - VWAP_SLOPE_LOOKBACK]) / VWAP_SLOPE_LOOKBACK as f64);
    let rsi_slope = slope(&rsi_series(&closes, RSI_PERIOD), RSI_SLOPE_BARS);

    Some(Indicators {
        last_price: last.close,
        vwap,
        vwap_slope,
        rsi: rsi(&closes, RSI_PERIOD),
        rsi_slope,
        macd_histogram: macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL).map(|m| m.histogram),
        ha_color: heiken_ashi_color(candles),
        ha_run: heiken_ashi_run(candles),
        failed_vwap_reclaim: vwap.is_some_and(|v| failed_vwap_reclaim(&closes, v, &vwaps)),
    })
}

/// Raw probability of Up from additive indicator votes
pub fn score_direction(ind: &Indicators) -> f64 {
    let mut up = 1.0;
    let mut down = 1.0;

    if let Some(vwap) = ind.vwap {
        if ind.last_price > vwap {
            up += 2.0;
        } else if ind.last_price < vwap {
            down += 2.0;
        }
    }
    if let Some(s) = ind.vwap_slope {
        if s > 0.0 {
            up += 2.0;
        } else if s < 0.0 {
            down += 2.0;
        }
    }
    if let (Some(rsi), Some(s)) = (ind.rsi, ind.rsi_slope) {
        if rsi > 55.0 && s > 0.0 {
            up += 2.0;
        }
        if rsi < 45.0 && s < 0.0 {
            down += 2.0;
        }
    }
    if let Some(h) = ind.macd_histogram {
        if h > 0.0 {
            up += 1.0;
        } else if h < 0.0 {
            down += 1.0;
        }
    }
    if ind.ha_run >= 2 {
        match ind.ha_color {
            Some(HaColor::Green) => up += 1.0,
            Some(HaColor::Red) => down += 1.0,
            None => {}
        }
    }
    if ind.failed_vwap_reclaim {
        down += 3.0;
    }

    up / (up + down)
}

/// Pull `raw_up` toward 0.5 in proportion to the time left in the window
///
/// No remaining time (or unknown) is fully neutral.
pub fn apply_time_decay(raw_up: f64, remaining_minutes: Option<f64>, window_minutes: f64) -> f64 {
    let decay = match remaining_minutes {
        Some(rem) if rem >= 0.0 && window_minutes > 0.0 => (rem / window_minutes).clamp(0.0, 1.0),
        _ => 0.0,
    };
    (0.5 + (raw_up - 0.5) * decay).clamp(0.0, 1.0)
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(dec!(0.5)).round_dp(4)
}

fn thin_warning(side: &str, recommended: Decimal, max_safe: Decimal) -> Option<String> {
    let thin = max_safe < THIN_LIQUIDITY_USD || recommended >= max_safe * dec!(0.99);
    thin.then(|| format!("Thin liquidity ({side}). Max safe: ${}", max_safe.round_dp(0)))
}

/// Technical-analysis engine for 15-minute markets
#[derive(Debug, Clone)]
pub struct IntradayEngine {
    sizer: KellySizer,
    window_minutes: f64,
}

impl IntradayEngine {
    pub fn new(sizer: KellySizer) -> Self {
        Self {
            sizer,
            window_minutes: WINDOW_MINUTES,
        }
    }

    pub fn from_config(risk: &RiskConfig) -> Self {
        Self::new(KellySizer::from_config(risk))
    }

    /// Produce a decision and stake for one Up/Down quote
    pub fn run_engine_15m(
        &self,
        quote: &UpDownQuote,
        remaining_minutes: Option<f64>,
        bankroll: Decimal,
        candles: &[Candle],
    ) -> Signal15mResult {
        let mut result = Signal15mResult {
            id: Uuid::new_v4(),
            direction: Direction15m::NoTrade,
            raw_up: None,
            model_up: dec!(0.5),
            model_down: dec!(0.5),
            market_up_norm: quote.market_up_norm,
            market_down_norm: quote.market_down_norm,
            edge_up: None,
            edge_down: None,
            recommended_usd: Decimal::ZERO,
            phase: Phase::Early,
            remaining_minutes,
            indicators: None,
            note: None,
            liquidity_warning: None,
            generated_at: Utc::now(),
        };

        let indicators = match compute_indicators(candles) {
            Some(ind) if candles.len() >= MIN_CANDLES => ind,
            _ => {
                tracing::info!(candles = candles.len(), "signal_15m_insufficient_klines");
                result.note = Some(INSUFFICIENT_KLINES_NOTE.to_string());
                telemetry::record_signal("15m", result.direction.as_str());
                return result;
            }
        };

        let raw_up = score_direction(&indicators);
        let model_up = to_decimal(apply_time_decay(raw_up, remaining_minutes, self.window_minutes));
        let model_down = Decimal::ONE - model_up;
        let edge_up = (model_up - quote.market_up_norm).round_dp(4);
        let edge_down = (model_down - quote.market_down_norm).round_dp(4);

        let phase = Phase::from_remaining(remaining_minutes);
        let (side, edge, model) = if edge_up > edge_down {
            (Direction15m::BuyUp, edge_up, model_up)
        } else {
            (Direction15m::BuyDown, edge_down, model_down)
        };
        let direction = if edge >= phase.edge_threshold() && model >= phase.min_probability() {
            side
        } else {
            Direction15m::NoTrade
        };

        let (recommended, warning) = match direction {
            Direction15m::BuyUp => {
                let rec =
                    self.sizer
                        .recommended_size(model_up, quote.market_up_norm, bankroll, quote.max_safe_up_usd, None);
                (rec, thin_warning("Up", rec, quote.max_safe_up_usd))
            }
            Direction15m::BuyDown => {
                let price = quote.market_down_norm.clamp(dec!(0.01), dec!(0.99));
                let rec = self
                    .sizer
                    .recommended_size(model_down, price, bankroll, quote.max_safe_down_usd, None);
                (rec, thin_warning("Down", rec, quote.max_safe_down_usd))
            }
            Direction15m::NoTrade => (Decimal::ZERO, None),
        };

        tracing::info!(
            direction = %direction,
            phase = %phase,
            raw_up,
            model_up = %model_up,
            edge_up = %edge_up,
            edge_down = %edge_down,
            recommended_usd = %recommended,
            "signal_15m_generated"
        );
        telemetry::record_signal("15m", direction.as_str());

        result.direction = direction;
        result.raw_up = Some(to_decimal(raw_up));
        result.model_up = model_up;
        result.model_down = model_down;
        result.edge_up = Some(edge_up);
        result.edge_down = Some(edge_down);
        result.recommended_usd = recommended;
        result.phase = phase;
        result.indicators = Some(indicators);
        result.liquidity_warning = warning;
        result
    }
}

impl Default for IntradayEngine {
    fn default() -> Self {
        Self::from_config(&RiskConfig::default())
    }
}
