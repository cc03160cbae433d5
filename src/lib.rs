//! poly-signal: Signal and risk-sizing engine for Polymarket BTC markets
//!
//! This library provides the core components for:
//! - Market-data source fetchers with retry and per-source circuit breakers
//! - Concurrent, horizon-aware fetch orchestration into feature snapshots
//! - Weighted composite scoring, probability mapping and the edge gate
//! - Order book depth and fractional Kelly sizing
//! - Intraday technical-analysis engine for 15-minute Up/Down markets
//! - Outcome grading and calibration statistics
//! - JSON Lines journal of snapshots and signals
//! - Structured logging and Prometheus metrics

pub mod analytics;
pub mod cli;
pub mod config;
pub mod data;
pub mod fetch;
pub mod intraday;
pub mod market;
pub mod orderbook;
pub mod reliability;
pub mod risk;
pub mod signal;
pub mod telemetry;

