//! Concurrent fetch orchestration
//!
//! Every fetcher runs in its own task under the reliability wrapper. Results
//! are joined by source id, so completion order does not matter, and tasks
//! still pending at the snapshot deadline are abandoned with `error="timeout"`.

use super::{FeatureSnapshot, FetchError, FetchResult, FetcherRegistry, SourceFetcher, SourceId, TIMEOUT};
use crate::config::Config;
use crate::market::Market;
use crate::reliability::{run_with_retry, CircuitRegistry, RetryPolicy};
use crate::signal::WeightTable;
use crate::telemetry;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

/// HTTP requests one fetch attempt may chain: a primary venue plus a fallback
/// or cross-check
const REQUESTS_PER_ATTEMPT: u32 = 2;

/// Runs fetcher sets and picks weights by market horizon
pub struct FetchOrchestrator {
    registry: FetcherRegistry,
    circuits: Arc<CircuitRegistry>,
    policy: RetryPolicy,
    deadline: Duration,
    weights: WeightTable,
}

impl FetchOrchestrator {
    pub fn new(
        registry: FetcherRegistry,
        circuits: Arc<CircuitRegistry>,
        policy: RetryPolicy,
        deadline: Duration,
        weights: WeightTable,
    ) -> Self {
        Self {
            registry,
            circuits,
            policy,
            deadline,
            weights,
        }
    }

    /// Build fetchers, breakers, retry policy, and long-horizon weights from configuration
    ///
    /// The snapshot deadline is raised to the retry policy's worst case so a
    /// fetcher that exhausts its retries reports its own error, not a timeout.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let fetch = &config.fetch;
        let policy = RetryPolicy::new(fetch.retry_attempts, fetch.retry_base_delay());
        let deadline = snapshot_deadline(fetch.snapshot_deadline(), &policy, fetch.timeout());
        Ok(Self::new(
            FetcherRegistry::from_config(config)?,
            Arc::new(CircuitRegistry::new(fetch.circuit_failure_threshold, fetch.circuit_open())),
            policy,
            deadline,
            WeightTable::resolve(&config.sources),
        ))
    }

    /// Shared breaker table
    pub fn circuits(&self) -> &Arc<CircuitRegistry> {
        &self.circuits
    }

    /// Long-horizon weights resolved from configuration
    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Run the long-horizon fetcher set
    pub async fn run_all_fetchers(&self) -> FeatureSnapshot {
        let snapshot = self.run(self.registry.long_horizon()).await;
        log_complete(&snapshot, "daily");
        snapshot
    }

    /// Run the fetcher set for a market's horizon and return matching weights
    pub async fn run_fetchers_for_market(&self, market: &Market) -> (FeatureSnapshot, WeightTable) {
        let horizon = market.horizon();
        if !horizon.is_short() {
            return (self.run_all_fetchers().await, self.weights.clone());
        }
        let snapshot = self.run(self.registry.short_horizon()).await;
        log_complete(&snapshot, "hourly");
        (snapshot, WeightTable::hourly())
    }

    async fn run(&self, fetchers: Vec<Arc<dyn SourceFetcher>>) -> FeatureSnapshot {
        let deadline = Instant::now() + self.deadline;

        let tasks: Vec<(SourceId, JoinHandle<FetchResult>)> = fetchers
            .into_iter()
            .map(|fetcher| {
                let source = fetcher.source_id();
                let circuits = Arc::clone(&self.circuits);
                let policy = self.policy.clone();
                let handle = tokio::spawn(async move {
                    let started = std::time::Instant::now();
                    let result = run_with_retry(source, &policy, &circuits, || fetcher.fetch()).await;
                    telemetry::record_fetch(&result, started.elapsed());
                    result
                });
                (source, handle)
            })
            .collect();

        let results = join_all(tasks.into_iter().map(|(source, mut handle)| async move {
            match timeout_at(deadline, &mut handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    tracing::error!(source_id = %source, error = %e, "fetcher_task_failed");
                    FetchResult::failed(source, e.to_string())
                }
                Err(_) => {
                    handle.abort();
                    tracing::warn!(source_id = %source, "fetcher_timeout");
                    FetchResult::failed(source, TIMEOUT)
                }
            }
        }))
        .await;

        FeatureSnapshot::new(results)
    }
}

fn log_complete(snapshot: &FeatureSnapshot, market_type: &'static str) {
    let errors = snapshot.results.values().filter(|r| r.error.is_some()).count();
    tracing::info!(
        count = snapshot.len(),
        errors,
        scored = snapshot.scored_count(),
        market_type,
        "fetchers_complete"
    );
}

/// Configured deadline, or the retry worst case when that is longer
fn snapshot_deadline(configured: Duration, policy: &RetryPolicy, request_timeout: Duration) -> Duration {
    let worst_case = policy.worst_case(request_timeout.saturating_mul(REQUESTS_PER_ATTEMPT));
    if worst_case > configured {
        tracing::info!(
            configured_secs = configured.as_secs_f64(),
            deadline_secs = worst_case.as_secs_f64(),
            "snapshot_deadline_raised"
        );
        return worst_case;
    }
    configured
}
