//! Analytics module
//!
//! Outcome grading and aggregate statistics over resolved signal runs

mod outcome;
mod stats;

pub use outcome::{grade, ActualResult, AnalyticsError, OutcomeLabel, OutcomeRecord, ResolvedRun};
pub use stats::{
    calibration, calibration_error, current_streak, factor_attribution, filter_date_range, max_consecutive_losses,
    win_rate, CalibrationBucket, FactorAttribution, StatsSummary, WinRate, BUCKET_SIZE,
};
