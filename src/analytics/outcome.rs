//! Outcome labels and grading

use crate::signal::{Direction, FactorContribution};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Caller misuse when recording outcomes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("outcome must be WIN, LOSS, or SKIP, got {0:?}")]
    InvalidOutcome(String),
    #[error("actual result must be YES or NO, got {0:?}")]
    InvalidActualResult(String),
}

/// Graded result of a signal run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeLabel {
    Win,
    Loss,
    /// No position was taken
    Skip,
}

impl OutcomeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeLabel::Win => "WIN",
            OutcomeLabel::Loss => "LOSS",
            OutcomeLabel::Skip => "SKIP",
        }
    }

    /// Win or loss, as opposed to skipped
    pub fn is_decided(&self) -> bool {
        !matches!(self, OutcomeLabel::Skip)
    }
}

impl fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels are matched exactly
impl FromStr for OutcomeLabel {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WIN" => Ok(OutcomeLabel::Win),
            "LOSS" => Ok(OutcomeLabel::Loss),
            "SKIP" => Ok(OutcomeLabel::Skip),
            other => Err(AnalyticsError::InvalidOutcome(other.to_string())),
        }
    }
}

/// How a settled market resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActualResult {
    Yes,
    No,
}

impl FromStr for ActualResult {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "YES" => Ok(ActualResult::Yes),
            "NO" => Ok(ActualResult::No),
            other => Err(AnalyticsError::InvalidActualResult(other.to_string())),
        }
    }
}

/// WIN when the traded side matches the resolution; runs without a trade are skipped
pub fn grade(direction: Direction, actual: ActualResult) -> OutcomeLabel {
    match (direction, actual) {
        (Direction::NoTrade, _) => OutcomeLabel::Skip,
        (Direction::Yes, ActualResult::Yes) | (Direction::No, ActualResult::No) => OutcomeLabel::Win,
        _ => OutcomeLabel::Loss,
    }
}

/// Validated outcome for a run, as handed to the persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub outcome: OutcomeLabel,
    pub actual_result: Option<ActualResult>,
    pub resolved_at: DateTime<Utc>,
}

impl OutcomeRecord {
    /// Parse caller-supplied labels; anything unrecognized is rejected
    pub fn parse(outcome: &str, actual_result: Option<&str>) -> Result<Self, AnalyticsError> {
        Ok(Self {
            outcome: outcome.parse()?,
            actual_result: actual_result.map(str::parse).transpose()?,
            resolved_at: Utc::now(),
        })
    }
}

/// A signal run with a recorded outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRun {
    pub run_at: DateTime<Utc>,
    pub model_p: Option<Decimal>,
    pub outcome: OutcomeLabel,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub reasoning: Vec<FactorContribution>,
}
