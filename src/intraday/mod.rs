//! Intraday module
//!
//! Technical-analysis probability model for 15-minute Up/Down markets

mod engine;
pub mod indicators;
mod types;

pub use engine::{
    apply_time_decay, compute_indicators, score_direction, IntradayEngine, MIN_CANDLES, RSI_PERIOD, WINDOW_MINUTES,
};
pub use types::{Direction15m, Indicators, Phase, Signal15mResult};
