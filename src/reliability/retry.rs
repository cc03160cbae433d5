//! Retry with exponential backoff, gated by the circuit breaker

use super::CircuitRegistry;
use crate::fetch::{FetchError, FetchResult, SourceId, CIRCUIT_OPEN};
use std::future::Future;
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per call, including the first
    pub attempts: u32,
    /// Delay before the second attempt; doubles each time
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Backoff after the zero-based `attempt` failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Longest a call can take when every attempt runs for `per_attempt`
    pub fn worst_case(&self, per_attempt: Duration) -> Duration {
        let backoff = (0..self.attempts.saturating_sub(1))
            .map(|attempt| self.delay_for(attempt))
            .fold(Duration::ZERO, Duration::saturating_add);
        per_attempt.saturating_mul(self.attempts).saturating_add(backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Run a fetch under the source's circuit breaker with retries
///
/// Never fails: an open circuit yields `error="circuit_open"` without
/// calling `fetch_fn`, and exhausted retries yield the last error message.
/// Non-transient errors stop retrying early but still count as a failure.
pub async fn run_with_retry<F, Fut>(
    source: SourceId,
    policy: &RetryPolicy,
    circuits: &CircuitRegistry,
    mut fetch_fn: F,
) -> FetchResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<FetchResult, FetchError>>,
{
    if circuits.is_open(source) {
        tracing::debug!(source_id = %source, "circuit_open_skip");
        return FetchResult::failed(source, CIRCUIT_OPEN);
    }

    let attempts = policy.attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        match fetch_fn().await {
            Ok(result) => {
                circuits.record_success(source);
                return result;
            }
            Err(e) => {
                let transient = e.is_transient();
                let final_attempt = attempt + 1 >= attempts || !transient;
                if final_attempt {
                    last_error = Some(e);
                    break;
                }
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    source_id = %source,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "fetcher_retry"
                );
                last_error = Some(e);
                tokio::time::sleep(delay).await;
            }
        }
    }

    let message = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "fetch failed".to_string());

    if circuits.record_failure(source) {
        tracing::warn!(source_id = %source, error = %message, "circuit_open");
    }
    tracing::warn!(source_id = %source, error = %message, "fetcher_failed");

    FetchResult::failed(source, message)
}
