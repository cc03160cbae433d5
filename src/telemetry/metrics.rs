//! Prometheus metrics

use crate::fetch::{FetchResult, SourceId, CIRCUIT_OPEN, OUT_OF_RANGE};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

const FETCH_TOTAL: &str = "polysignal_fetch_total";
const FETCH_LATENCY: &str = "polysignal_fetch_latency_seconds";
const CIRCUIT_OPEN_GAUGE: &str = "polysignal_circuit_open";
const SIGNALS_TOTAL: &str = "polysignal_signals_total";

/// Start the Prometheus scrape endpoint on `0.0.0.0:port`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;
    tracing::info!(port, "Prometheus exporter listening");
    Ok(())
}

/// Outcome label for a completed fetch
pub fn fetch_outcome(result: &FetchResult) -> &'static str {
    match result.error.as_deref() {
        None => "ok",
        Some(CIRCUIT_OPEN) => "circuit_open",
        Some(OUT_OF_RANGE) => "out_of_range",
        Some(_) if result.has_score() => "ok",
        Some(_) => "error",
    }
}

/// Record one fetch outcome and its latency
pub fn record_fetch(result: &FetchResult, elapsed: Duration) {
    let source = result.source_id.as_str();
    ::metrics::counter!(FETCH_TOTAL, "source" => source, "outcome" => fetch_outcome(result)).increment(1);
    ::metrics::histogram!(FETCH_LATENCY, "source" => source).record(elapsed.as_secs_f64());
}

/// Track a source's circuit state
pub fn set_circuit_open(source: SourceId, open: bool) {
    ::metrics::gauge!(CIRCUIT_OPEN_GAUGE, "source" => source.as_str()).set(if open { 1.0 } else { 0.0 });
}

/// Count a produced signal
pub fn record_signal(engine: &'static str, direction: &'static str) {
    ::metrics::counter!(SIGNALS_TOTAL, "engine" => engine, "direction" => direction).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fetch_outcome_labels() {
        let ok = FetchResult::scored(SourceId::Dxy, "1", dec!(1), false);
        assert_eq!(fetch_outcome(&ok), "ok");
        assert_eq!(fetch_outcome(&FetchResult::failed(SourceId::Dxy, CIRCUIT_OPEN)), "circuit_open");
        assert_eq!(fetch_outcome(&FetchResult::failed(SourceId::Dxy, OUT_OF_RANGE)), "out_of_range");
        assert_eq!(fetch_outcome(&FetchResult::failed(SourceId::Dxy, "boom")), "error");
        let neutral = FetchResult::scored(SourceId::Macro, "no_event", dec!(0.5), false).with_error("timeout");
        assert_eq!(fetch_outcome(&neutral), "ok");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let ok = FetchResult::scored(SourceId::Dxy, "1", dec!(1), false);
        record_fetch(&ok, Duration::from_millis(5));
        set_circuit_open(SourceId::Dxy, true);
        record_signal("daily", "YES");
    }
}
