//! CLI interface for poly-signal
//!
//! Provides subcommands for:
//! - `signal`: Long-horizon signal for a Yes/No market
//! - `signal15m`: Intraday signal for a 15-minute Up/Down market
//! - `sources`: Run every enabled fetcher once
//! - `stats`: Aggregate statistics over resolved runs
//! - `config`: Show the effective configuration

mod signal;
mod signal15m;
mod sources;
mod stats;

pub use signal::SignalArgs;
pub use signal15m::Signal15mArgs;
pub use sources::SourcesArgs;
pub use stats::StatsArgs;

use crate::orderbook::OrderBook;
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "poly-signal")]
#[command(about = "Signal and sizing engine for Polymarket BTC markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a signal for a Yes/No market
    Signal(SignalArgs),
    /// Generate a signal for a 15-minute Up/Down market
    #[command(name = "signal15m")]
    Signal15m(Signal15mArgs),
    /// Run all enabled fetchers and print the snapshot
    Sources(SourcesArgs),
    /// Print statistics over resolved runs
    Stats(StatsArgs),
    /// Show the effective configuration
    Config,
}

/// Output rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Read a saved CLOB `/book` response
pub(crate) fn read_book(path: &Path) -> anyhow::Result<OrderBook> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    text.parse::<OrderBook>().with_context(|| format!("parsing order book {}", path.display()))
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
