//! Signal generation module
//!
//! Composite scoring, probability mapping, edge gating, and the
//! long-horizon engine that ties them to Kelly sizing

mod edge;
mod engine;
mod probability;
mod reasoning;
mod types;
mod weights;

pub use edge::{EdgeDecision, EdgeGate};
pub use engine::{liquidity_warning, SignalEngine, SizingOverrides, THIN_LIQUIDITY_USD};
pub use probability::{score_to_model_p, MAX_MODEL_P, MIN_MODEL_P};
pub use reasoning::{build_reasoning, missing_sources};
pub use types::{Direction, FactorContribution, Reasoning, SignalResult};
pub use weights::{weighted_score, WeightTable};
