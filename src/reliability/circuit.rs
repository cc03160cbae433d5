//! Per-source circuit breaker table

use crate::fetch::SourceId;
use crate::telemetry;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Breaker state for one source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CircuitState {
    /// Consecutive failed fetches
    pub failure_count: u32,
    /// Calls short-circuit until this deadline
    pub open_until: Option<Instant>,
}

/// Circuit breakers keyed by source
///
/// Half-open by timeout: once the deadline passes the state resets to zero
/// failures and the next call goes through.
#[derive(Debug)]
pub struct CircuitRegistry {
    failure_threshold: u32,
    open_for: Duration,
    states: Mutex<HashMap<SourceId, CircuitState>>,
}

impl CircuitRegistry {
    pub fn new(failure_threshold: u32, open_for: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            open_for,
            states: Mutex::new(HashMap::new()),
        }
    }

    fn with_states<R>(&self, f: impl FnOnce(&mut HashMap<SourceId, CircuitState>) -> R) -> R {
        let mut guard = self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// True while the source's circuit is open; resets an expired circuit
    pub fn is_open(&self, source: SourceId) -> bool {
        let now = Instant::now();
        self.with_states(|states| {
            let Some(state) = states.get_mut(&source) else {
                return false;
            };
            match state.open_until {
                Some(deadline) if now < deadline => true,
                Some(_) => {
                    *state = CircuitState::default();
                    telemetry::set_circuit_open(source, false);
                    tracing::info!(source_id = %source, "circuit_closed");
                    false
                }
                None => false,
            }
        })
    }

    pub fn record_success(&self, source: SourceId) {
        self.with_states(|states| {
            states.insert(source, CircuitState::default());
        });
    }

    /// Count a failed fetch; returns true when this failure opened the circuit
    pub fn record_failure(&self, source: SourceId) -> bool {
        let now = Instant::now();
        let opened = self.with_states(|states| {
            let state = states.entry(source).or_default();
            state.failure_count += 1;
            if state.failure_count >= self.failure_threshold && state.open_until.is_none() {
                state.open_until = Some(now + self.open_for);
                true
            } else {
                false
            }
        });
        if opened {
            telemetry::set_circuit_open(source, true);
        }
        opened
    }

    /// Snapshot of a source's state
    pub fn state(&self, source: SourceId) -> CircuitState {
        self.with_states(|states| states.get(&source).copied().unwrap_or_default())
    }

    /// Clear every circuit
    pub fn reset(&self) {
        self.with_states(|states| states.clear());
    }
}
