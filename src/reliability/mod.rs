//! Reliability wrapper around source fetchers
//!
//! Retry with exponential backoff plus a per-source circuit breaker. The
//! circuit table is an injectable registry owned by the orchestrator.

mod circuit;
mod retry;

pub use circuit::{CircuitRegistry, CircuitState};
pub use retry::{run_with_retry, RetryPolicy};
