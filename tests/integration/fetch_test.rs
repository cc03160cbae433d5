//! Fetchers and the CLOB client against mock HTTP servers

use chrono::Utc;
use poly_signal::config::Config;
use poly_signal::fetch::{
    fetch_klines_1m, EtfFlowsFetcher, FearGreedFetcher, FetchError, FetchOrchestrator, FundingFetcher, HttpClient,
    PriceMaFetcher, SourceFetcher, SourceId, NO_API_KEY, OUT_OF_RANGE,
};
use poly_signal::market::{ClobClient, QuoteProvider};
use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http() -> HttpClient {
    HttpClient::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fear_greed_scores_extreme_fear() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fng/"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"value": "20", "timestamp": Utc::now().timestamp().to_string()}]
        })))
        .mount(&server)
        .await;

    let fetcher = FearGreedFetcher::new(http(), format!("{}/fng/", server.uri()));
    let result = fetcher.fetch().await.unwrap();

    assert_eq!(result.source_id, SourceId::FearGreed);
    assert_eq!(result.raw_value.as_deref(), Some("20"));
    assert_eq!(result.normalized_score, Some(dec!(2)));
    assert!(!result.stale);
}

#[tokio::test]
async fn test_fear_greed_rejects_out_of_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"value": "140", "timestamp": "1700000000"}]
        })))
        .mount(&server)
        .await;

    let result = FearGreedFetcher::new(http(), server.uri()).fetch().await.unwrap();

    assert_eq!(result.error.as_deref(), Some(OUT_OF_RANGE));
    assert_eq!(result.raw_value.as_deref(), Some("140"));
    assert!(result.normalized_score.is_none());
}

#[tokio::test]
async fn test_funding_falls_back_to_bybit_on_451() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/premiumIndex"))
        .respond_with(ResponseTemplate::new(451))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v5/market/funding/history"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"list": [{
                "fundingRate": "-0.0005",
                "fundingRateTimestamp": Utc::now().timestamp_millis().to_string()
            }]}
        })))
        .mount(&server)
        .await;

    let fetcher = FundingFetcher::new(http(), server.uri(), server.uri());
    let result = fetcher.fetch().await.unwrap();

    assert_eq!(result.normalized_score, Some(dec!(1)));
    assert!(!result.stale);
}

#[tokio::test]
async fn test_rate_limit_is_transient_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = FearGreedFetcher::new(http(), server.uri()).fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::RateLimited(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_etf_flows_marks_old_data_stale() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "btc_etf_net_flow_usd": 350.0,
            "date": "2024-01-02"
        })))
        .mount(&server)
        .await;

    let result = EtfFlowsFetcher::new(http(), format!("{}/flows", server.uri()))
        .fetch()
        .await
        .unwrap();

    assert_eq!(result.normalized_score, Some(dec!(2)));
    assert!(result.stale);
}

/// 50 flat daily closes at 100 followed by `last`
fn daily_closes(last: f64) -> Vec<f64> {
    let mut closes = vec![100.0; 50];
    closes.push(last);
    closes
}

#[tokio::test]
async fn test_price_ma_ages_from_last_open_time() {
    let server = MockServer::start().await;
    let day_ms = 86_400_000i64;
    // The forming daily bar opened two hours ago and closes in the future
    let last_open = Utc::now().timestamp_millis() - 2 * 3_600_000;
    let closes = daily_closes(102.0);
    let first_open = last_open - (closes.len() as i64 - 1) * day_ms;
    let rows: Vec<_> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let open = first_open + i as i64 * day_ms;
            json!([open, "100", "103", "99", close.to_string(), "1", open + day_ms - 1])
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("interval", "1d"))
        .and(query_param("limit", "51"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(rows)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "prices": [[Utc::now().timestamp_millis(), 102.0]]
        })))
        .mount(&server)
        .await;

    let fetcher = PriceMaFetcher::new(http(), server.uri(), server.uri());
    let result = fetcher.fetch().await.unwrap();

    assert_eq!(result.source_id, SourceId::PriceMa);
    assert_eq!(result.raw_value.as_deref(), Some("2.00"));
    assert_eq!(result.normalized_score, Some(dec!(0.5)));
    assert!(result.stale);
}

#[tokio::test]
async fn test_price_ma_falls_back_to_coingecko_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let now_ms = Utc::now().timestamp_millis();
    let closes = daily_closes(94.0);
    let prices: Vec<_> = closes
        .iter()
        .enumerate()
        .map(|(i, price)| json!([now_ms - (closes.len() - 1 - i) as i64 * 86_400_000, price]))
        .collect();
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .and(query_param("vs_currency", "usd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "prices": prices })))
        .mount(&server)
        .await;

    let fetcher = PriceMaFetcher::new(http(), server.uri(), server.uri());
    let result = fetcher.fetch().await.unwrap();

    assert!(result.error.is_none());
    assert_eq!(result.raw_value.as_deref(), Some("-6.00"));
    assert_eq!(result.normalized_score, Some(dec!(-1)));
    assert!(!result.stale);
}

#[tokio::test]
async fn test_klines_1m_parse_and_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("interval", "1m"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            [1700000000000i64, "100.0", "101.0", "99.0", "100.5", "12.0", 1700000059999i64],
            [1700000060000i64, "100.5", "102.0", "100.0", "101.5", "8.0", 1700000119999i64],
            [1700000120000i64, "101.5"]
        ])))
        .mount(&server)
        .await;

    let url = format!("{}/api/v3/klines", server.uri());
    let candles = fetch_klines_1m(&http(), &url, 240).await;
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[1].close, 101.5);

    let missing = fetch_klines_1m(&http(), &format!("{}/nope", server.uri()), 240).await;
    assert!(missing.is_empty());
}

#[tokio::test]
async fn test_clob_quote_from_book() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book"))
        .and(query_param("token_id", "123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "asset_id": "123",
            "bids": [{"price": "0.40", "size": "500"}, {"price": "0.41", "size": "100"}],
            "asks": [{"price": "0.45", "size": "100"}, {"price": "0.43", "size": "100"}]
        })))
        .mount(&server)
        .await;

    let clob = ClobClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let quote = clob.market_quote("123", dec!(0.01)).await.unwrap();

    assert_eq!(quote.best_bid, Some(dec!(0.41)));
    assert_eq!(quote.best_ask, dec!(0.43));
    assert_eq!(quote.spread, Some(dec!(0.02)));
    assert_eq!(quote.implied_prob_yes, dec!(0.43));
    assert_eq!(quote.max_safe_size_usd, dec!(43));
}

#[tokio::test]
async fn test_orchestrator_degrades_when_upstreams_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.fetch.retry_attempts = 1;
    config.fetch.retry_base_delay_secs = 0.01;
    let uri = server.uri();
    let endpoints = &mut config.endpoints;
    endpoints.binance_spot = uri.clone();
    endpoints.binance_futures = uri.clone();
    endpoints.bybit = uri.clone();
    endpoints.coingecko = uri.clone();
    endpoints.dxy = uri.clone();
    endpoints.fear_greed = uri.clone();
    endpoints.etf_flows = uri.clone();
    endpoints.fmp_calendar = uri;

    let orchestrator = FetchOrchestrator::from_config(&config).unwrap();
    let snapshot = orchestrator.run_all_fetchers().await;

    assert_eq!(snapshot.len(), 7);
    let fear_greed = snapshot.get(SourceId::FearGreed).unwrap();
    assert!(fear_greed.error.as_deref().unwrap().contains("503"));
    assert_eq!(
        snapshot.get(SourceId::ExchangeNetflow).unwrap().error.as_deref(),
        Some(NO_API_KEY)
    );
    // Without an FMP key the macro source stays neutral
    assert_eq!(snapshot.get(SourceId::Macro).unwrap().normalized_score, Some(dec!(0.5)));
    assert_eq!(orchestrator.circuits().state(SourceId::FearGreed).failure_count, 1);
}
