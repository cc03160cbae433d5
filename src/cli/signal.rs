//! Signal command implementation

use super::{print_json, read_book, OutputFormat};
use crate::config::Config;
use crate::data::{JsonlJournal, SnapshotSink};
use crate::fetch::FetchOrchestrator;
use crate::market::{ClobClient, Market, MarketQuote, QuoteProvider};
use crate::orderbook::{slippage_bps, BookSide, OrderBook};
use crate::signal::{SignalEngine, SignalResult, SizingOverrides};
use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SignalArgs {
    /// Market slug; selects the fetcher set and weight table
    pub slug: String,

    /// Saved CLOB order book JSON for the Yes token
    #[arg(long, conflicts_with_all = ["ask", "yes_token_id"])]
    pub book: Option<PathBuf>,

    /// Yes token id; the book is fetched from the CLOB
    #[arg(long)]
    pub yes_token_id: Option<String>,

    /// Best bid for Yes
    #[arg(long, requires = "ask")]
    pub bid: Option<Decimal>,

    /// Best ask for Yes
    #[arg(long)]
    pub ask: Option<Decimal>,

    /// Max safe size (USD) when quoting from flags
    #[arg(long, default_value = "0")]
    pub depth: Decimal,

    /// Bankroll (USD); defaults to the configured bankroll
    #[arg(long)]
    pub bankroll: Option<Decimal>,

    /// Hard cap on the stake (USD)
    #[arg(long)]
    pub max_bet: Option<Decimal>,

    /// Kelly multiplier override
    #[arg(long)]
    pub kelly: Option<Decimal>,

    /// Append the snapshot and signal to this journal
    #[arg(long)]
    pub journal: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl SignalArgs {
    async fn quote(&self, config: &Config) -> anyhow::Result<(MarketQuote, Option<OrderBook>)> {
        let slippage = config.risk.slippage_limit;
        if let Some(path) = &self.book {
            let book = read_book(path)?;
            let quote = MarketQuote::from_book(&book, slippage)
                .with_context(|| format!("order book {} has no asks", path.display()))?;
            return Ok((quote, Some(book)));
        }
        if let Some(token_id) = &self.yes_token_id {
            let clob = ClobClient::new(&config.endpoints.polymarket_clob, config.fetch.timeout())?;
            let book = clob.order_book(token_id).await?;
            let quote = MarketQuote::from_book(&book, slippage)
                .with_context(|| format!("order book for {token_id} has no asks"))?;
            return Ok((quote, Some(book)));
        }
        let ask = self
            .ask
            .context("provide --book, --yes-token-id, or --bid/--ask/--depth")?;
        Ok((MarketQuote::new(self.bid, ask, self.depth), None))
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let market = Market::from_slug(&self.slug);
        let (quote, book) = self.quote(config).await?;

        let orchestrator = FetchOrchestrator::from_config(config)?;
        let (snapshot, weights) = orchestrator.run_fetchers_for_market(&market).await;

        let overrides = SizingOverrides {
            max_bet_usd: self.max_bet,
            kelly_fraction: self.kelly,
        };
        let result = SignalEngine::from_config(config)
            .run_engine(&snapshot, &quote, &weights, self.bankroll, &overrides)
            .for_market(&market);

        if let Some(path) = &self.journal {
            let journal = JsonlJournal::new(path);
            journal.record_snapshot(Some(&market.slug), &snapshot).await?;
            journal.record_signal(&result).await?;
        }

        match self.format {
            OutputFormat::Json => print_json(&result)?,
            OutputFormat::Table => {
                print!("{}", format_signal(&result));
                if let Some(book) = &book {
                    print_slippage(book, result.recommended_usd, quote.best_ask);
                }
            }
        }
        Ok(())
    }
}

fn format_signal(r: &SignalResult) -> String {
    let edge_no = r
        .edge_no
        .map(|e| format!("{e:+.4}"))
        .unwrap_or_else(|| "-".to_string());
    let mut out = format!(
        r#"
══════════════════════════════════════════════════════
               SIGNAL: {}
══════════════════════════════════════════════════════

Direction:        {}
Composite Score:  {:+.4}
Model P(Yes):     {:.4}
Market P(Yes):    {:.4}
Edge Yes / No:    {:+.4} / {edge_no}

SIZING
───────────────────────────────────────────────────────
Kelly Fraction:   {:.4}
Recommended:      ${:.2}
Max Safe Size:    ${:.2}
"#,
        r.market_slug.as_deref().unwrap_or("-"),
        r.direction,
        r.composite_score,
        r.model_p,
        r.market_p,
        r.edge_yes,
        r.kelly_fraction,
        r.recommended_usd,
        r.max_safe_size_usd,
    );
    if let Some(warning) = &r.liquidity_warning {
        out.push_str(&format!("Warning:          {warning}\n"));
    }
    out.push_str("\nFACTORS\n───────────────────────────────────────────────────────\n");
    for f in &r.reasoning.factors {
        let contribution = f
            .contribution
            .map(|c| format!("{c:+.4}"))
            .unwrap_or_else(|| "-".to_string());
        let note = match (&f.error, f.stale) {
            (Some(e), _) => format!("  [{e}]"),
            (None, true) => "  [stale]".to_string(),
            (None, false) => String::new(),
        };
        out.push_str(&format!(
            "{:<20} {:>10} x {:.2} = {contribution}{note}\n",
            f.factor.as_str(),
            f.raw_value.as_deref().unwrap_or("-"),
            f.weight,
        ));
    }
    out.push_str(&format!("\n{}\n", r.reasoning.summary));
    out.push_str("══════════════════════════════════════════════════════\n");
    out
}

/// Fill price of the recommended stake against the Yes asks
fn print_slippage(book: &OrderBook, stake: Decimal, best_ask: Decimal) {
    if stake <= Decimal::ZERO {
        return;
    }
    match book
        .vwap_for_notional(BookSide::Ask, stake)
        .and_then(|vwap| slippage_bps(best_ask, vwap).map(|bps| (vwap, bps)))
    {
        Some((vwap, bps)) => println!("Fill VWAP ${stake:.2}: {:.4} ({:.1} bps)", vwap, bps.round_dp(1)),
        None => println!("Fill VWAP ${stake:.2}: book too thin"),
    }
}
