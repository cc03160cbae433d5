//! Signal15m command implementation

use super::{print_json, read_book, OutputFormat};
use crate::config::Config;
use crate::fetch::{fetch_klines_1m, HttpClient};
use crate::intraday::{IntradayEngine, Signal15mResult};
use crate::market::{ClobClient, Market, QuoteProvider, UpDownQuote};
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct Signal15mArgs {
    /// Market slug, used for labelling only
    #[arg(long, default_value = "btc-updown-15m")]
    pub slug: String,

    /// Saved CLOB order book JSON for the Up token
    #[arg(long, requires = "down_book")]
    pub up_book: Option<PathBuf>,

    /// Saved CLOB order book JSON for the Down token
    #[arg(long, requires = "up_book")]
    pub down_book: Option<PathBuf>,

    /// Up token id; both books are fetched from the CLOB
    #[arg(long, requires = "down_token_id")]
    pub up_token_id: Option<String>,

    #[arg(long, requires = "up_token_id")]
    pub down_token_id: Option<String>,

    /// Up buy price when quoting from flags
    #[arg(long, requires = "down_price")]
    pub up_price: Option<Decimal>,

    /// Down buy price when quoting from flags
    #[arg(long, requires = "up_price")]
    pub down_price: Option<Decimal>,

    /// Max safe size for Up (USD)
    #[arg(long, default_value = "0")]
    pub up_depth: Decimal,

    /// Max safe size for Down (USD)
    #[arg(long, default_value = "0")]
    pub down_depth: Decimal,

    /// Minutes until the window closes
    #[arg(long, conflicts_with = "close_time")]
    pub remaining: Option<f64>,

    /// Window close time (RFC 3339)
    #[arg(long)]
    pub close_time: Option<DateTime<Utc>>,

    /// Bankroll (USD); defaults to the configured bankroll
    #[arg(long)]
    pub bankroll: Option<Decimal>,

    /// Number of 1-minute klines to fetch
    #[arg(long, default_value_t = 240)]
    pub klines: u32,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl Signal15mArgs {
    async fn quote(&self, config: &Config) -> anyhow::Result<UpDownQuote> {
        let slippage = config.risk.slippage_limit;
        if let (Some(up), Some(down)) = (&self.up_book, &self.down_book) {
            return UpDownQuote::from_books(&read_book(up)?, &read_book(down)?, slippage)
                .context("up/down books have no asks");
        }
        if let (Some(up), Some(down)) = (&self.up_token_id, &self.down_token_id) {
            let clob = ClobClient::new(&config.endpoints.polymarket_clob, config.fetch.timeout())?;
            return clob.up_down_quote(up, down, slippage).await;
        }
        match (self.up_price, self.down_price) {
            (Some(up), Some(down)) => Ok(UpDownQuote::from_prices(up, down, self.up_depth, self.down_depth)),
            _ => anyhow::bail!("provide --up-book/--down-book, token ids, or --up-price/--down-price"),
        }
    }

    fn remaining_minutes(&self) -> Option<f64> {
        if self.remaining.is_some() {
            return self.remaining;
        }
        let market = Market {
            close_time: self.close_time,
            ..Market::from_slug(&self.slug)
        };
        market.remaining_minutes(Utc::now())
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let quote = self.quote(config).await?;

        let http = HttpClient::new(config.fetch.timeout())?;
        let url = format!("{}/api/v3/klines", config.endpoints.binance_spot.trim_end_matches('/'));
        let candles = fetch_klines_1m(&http, &url, self.klines).await;

        let bankroll = self
            .bankroll
            .filter(|b| *b > Decimal::ZERO)
            .unwrap_or(config.risk.default_bankroll_usd);
        let result =
            IntradayEngine::from_config(&config.risk).run_engine_15m(&quote, self.remaining_minutes(), bankroll, &candles);

        match self.format {
            OutputFormat::Json => print_json(&result)?,
            OutputFormat::Table => print!("{}", format_signal_15m(&self.slug, &result)),
        }
        Ok(())
    }
}

fn format_signal_15m(slug: &str, r: &Signal15mResult) -> String {
    let edge = |e: Option<Decimal>| e.map(|e| format!("{e:+.4}")).unwrap_or_else(|| "-".to_string());
    let remaining = r
        .remaining_minutes
        .map(|m| format!("{m:.1} min"))
        .unwrap_or_else(|| "unknown".to_string());
    let mut out = format!(
        r#"
══════════════════════════════════════════════════════
               15M SIGNAL: {slug}
══════════════════════════════════════════════════════

Direction:        {}
Phase:            {} ({remaining})
Model Up / Down:  {:.4} / {:.4}
Market Up / Down: {:.4} / {:.4}
Edge Up / Down:   {} / {}
Recommended:      ${:.2}
"#,
        r.direction,
        r.phase,
        r.model_up,
        r.model_down,
        r.market_up_norm,
        r.market_down_norm,
        edge(r.edge_up),
        edge(r.edge_down),
        r.recommended_usd,
    );
    if let Some(warning) = &r.liquidity_warning {
        out.push_str(&format!("Warning:          {warning}\n"));
    }
    if let Some(note) = &r.note {
        out.push_str(&format!("Note:             {note}\n"));
    }
    if let Some(ind) = &r.indicators {
        let show = |v: Option<f64>, p: usize| v.map(|v| format!("{v:.p$}")).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "\nINDICATORS\n───────────────────────────────────────────────────────\n\
             Price:            {:.2}\n\
             VWAP (slope):     {} ({})\n\
             RSI (slope):      {} ({})\n\
             MACD Histogram:   {}\n\
             Heiken-Ashi:      {} x{}\n\
             Failed Reclaim:   {}\n",
            ind.last_price,
            show(ind.vwap, 2),
            show(ind.vwap_slope, 4),
            show(ind.rsi, 1),
            show(ind.rsi_slope, 2),
            show(ind.macd_histogram, 4),
            ind.ha_color.map(|c| format!("{c:?}")).unwrap_or_else(|| "-".to_string()),
            ind.ha_run,
            ind.failed_vwap_reclaim,
        ));
    }
    out.push_str("══════════════════════════════════════════════════════\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_remaining_from_close_time() {
        let mut args = Signal15mArgs {
            slug: "btc-updown-15m".to_string(),
            up_book: None,
            down_book: None,
            up_token_id: None,
            down_token_id: None,
            up_price: Some(dec!(0.5)),
            down_price: Some(dec!(0.5)),
            up_depth: dec!(0),
            down_depth: dec!(0),
            remaining: Some(7.5),
            close_time: None,
            bankroll: None,
            klines: 240,
            format: OutputFormat::Table,
        };
        assert_eq!(args.remaining_minutes(), Some(7.5));

        args.remaining = None;
        assert!(args.remaining_minutes().is_none());

        args.close_time = Some(Utc::now() + chrono::Duration::minutes(10));
        let remaining = args.remaining_minutes().unwrap();
        assert!(remaining > 9.9 && remaining <= 10.0);
    }

    #[test]
    fn test_format_insufficient_klines() {
        let quote = UpDownQuote::from_prices(dec!(0.55), dec!(0.47), dec!(200), dec!(200));
        let result = IntradayEngine::default().run_engine_15m(&quote, Some(8.0), dec!(1000), &[]);
        let table = format_signal_15m("btc-updown-15m", &result);
        assert!(table.contains("NO_TRADE"));
        assert!(table.contains("Insufficient 1m klines"));
        assert!(!table.contains("INDICATORS"));
    }
}
