//! Retry, circuit breaker, and orchestration deadline behavior

use async_trait::async_trait;
use poly_signal::fetch::{
    FeatureSnapshot, FetchError, FetchOrchestrator, FetchResult, FetcherRegistry, SourceFetcher, SourceId,
    CIRCUIT_OPEN, TIMEOUT,
};
use poly_signal::market::Market;
use poly_signal::reliability::{run_with_retry, CircuitRegistry, RetryPolicy};
use poly_signal::signal::WeightTable;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn unavailable() -> FetchError {
    FetchError::Status {
        status: 503,
        url: "https://upstream.test".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_between_attempts() {
    let circuits = CircuitRegistry::new(3, Duration::from_secs(300));
    let policy = RetryPolicy::new(3, Duration::from_secs(1));
    let calls = AtomicU32::new(0);
    let started = Instant::now();

    let result = run_with_retry(SourceId::Dxy, &policy, &circuits, || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(unavailable()) }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 1s after the first failure, 2s after the second
    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert!(result.error.as_deref().unwrap().contains("503"));
    assert_eq!(circuits.state(SourceId::Dxy).failure_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_circuit_opens_then_recovers() {
    let circuits = CircuitRegistry::new(3, Duration::from_secs(300));
    let policy = RetryPolicy::new(1, Duration::from_millis(10));
    let calls = AtomicU32::new(0);
    let failing = || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(unavailable()) }
    };

    for _ in 0..3 {
        run_with_retry(SourceId::Funding, &policy, &circuits, failing).await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let skipped = run_with_retry(SourceId::Funding, &policy, &circuits, failing).await;
    assert_eq!(skipped.error.as_deref(), Some(CIRCUIT_OPEN));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // Other sources are unaffected
    assert!(!circuits.is_open(SourceId::Dxy));

    tokio::time::advance(Duration::from_secs(301)).await;
    let recovered = run_with_retry(SourceId::Funding, &policy, &circuits, || async {
        Ok(FetchResult::scored(SourceId::Funding, "0.0001", dec!(0), false))
    })
    .await;
    assert!(recovered.error.is_none());
    assert_eq!(circuits.state(SourceId::Funding).failure_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_data_quality_result_is_not_retried() {
    let circuits = CircuitRegistry::new(1, Duration::from_secs(300));
    let policy = RetryPolicy::new(3, Duration::from_secs(1));
    let calls = AtomicU32::new(0);

    let result = run_with_retry(SourceId::FearGreed, &policy, &circuits, || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(FetchResult::rejected(SourceId::FearGreed, "140", "out_of_range")) }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.error.as_deref(), Some("out_of_range"));
    assert!(!circuits.is_open(SourceId::FearGreed));
}

struct Scripted {
    source: SourceId,
    score: Decimal,
    delay: Duration,
}

#[async_trait]
impl SourceFetcher for Scripted {
    fn source_id(&self) -> SourceId {
        self.source
    }

    async fn fetch(&self) -> Result<FetchResult, FetchError> {
        tokio::time::sleep(self.delay).await;
        Ok(FetchResult::scored(self.source, self.score.to_string(), self.score, false))
    }
}

fn scripted(source: SourceId, score: Decimal, delay_secs: u64) -> Arc<dyn SourceFetcher> {
    Arc::new(Scripted {
        source,
        score,
        delay: Duration::from_secs(delay_secs),
    })
}

fn orchestrator() -> FetchOrchestrator {
    let registry = FetcherRegistry::new(
        vec![
            scripted(SourceId::EtfFlows, dec!(2), 5),
            scripted(SourceId::FearGreed, dec!(-1), 1),
            scripted(SourceId::Dxy, dec!(1), 600),
        ],
        scripted(SourceId::Price1hMomentum, dec!(0.5), 2),
    );
    FetchOrchestrator::new(
        registry,
        Arc::new(CircuitRegistry::new(3, Duration::from_secs(300))),
        RetryPolicy::default(),
        Duration::from_secs(90),
        WeightTable::default(),
    )
}

fn score(snapshot: &FeatureSnapshot, source: SourceId) -> Option<Decimal> {
    snapshot.get(source).and_then(|r| r.normalized_score)
}

#[tokio::test(start_paused = true)]
async fn test_deadline_abandons_slow_fetchers() {
    let started = Instant::now();
    let snapshot = orchestrator().run_all_fetchers().await;

    assert!(started.elapsed() <= Duration::from_secs(91));
    assert_eq!(snapshot.len(), 3);
    assert_eq!(score(&snapshot, SourceId::EtfFlows), Some(dec!(2)));
    assert_eq!(score(&snapshot, SourceId::FearGreed), Some(dec!(-1)));
    assert_eq!(snapshot.get(SourceId::Dxy).unwrap().error.as_deref(), Some(TIMEOUT));
    assert!(snapshot.get(SourceId::Price1hMomentum).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_short_horizon_market_adds_momentum() {
    let market = Market::from_slug("bitcoin-up-or-down-march-5-2pm-et");
    let (snapshot, weights) = orchestrator().run_fetchers_for_market(&market).await;

    assert_eq!(score(&snapshot, SourceId::Price1hMomentum), Some(dec!(0.5)));
    assert_eq!(weights, WeightTable::hourly());
    assert_eq!(weights.get(SourceId::EtfFlows), Decimal::ZERO);
}
