//! Long-horizon signal engine
//!
//! Snapshot -> composite score -> model probability -> edge gate -> Kelly
//! stake. Pure over its inputs apart from logging and metrics.

use super::edge::EdgeGate;
use super::probability::score_to_model_p;
use super::reasoning::build_reasoning;
use super::weights::weighted_score;
use super::{Direction, SignalResult, WeightTable};
use crate::config::Config;
use crate::fetch::FeatureSnapshot;
use crate::market::MarketQuote;
use crate::risk::{kelly_fraction, KellySizer};
use crate::telemetry;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Below this depth (USD) liquidity is always flagged
pub const THIN_LIQUIDITY_USD: Decimal = dec!(100);
const MIN_PRICE: Decimal = dec!(0.01);
const MAX_PRICE: Decimal = dec!(0.99);

/// Per-caller sizing preferences
#[derive(Debug, Clone, Default)]
pub struct SizingOverrides {
    /// Hard cap on the stake (USD)
    pub max_bet_usd: Option<Decimal>,
    /// Replaces the configured Kelly multiplier
    pub kelly_fraction: Option<Decimal>,
}

/// Thin-liquidity warning for a stake against a depth
pub fn liquidity_warning(recommended: Decimal, max_safe: Decimal) -> Option<String> {
    let thin = max_safe < THIN_LIQUIDITY_USD || recommended >= max_safe * dec!(0.99);
    thin.then(|| format!("Thin liquidity. Max safe size: ${}", max_safe.round_dp(0)))
}

/// Composite-score engine for daily and hourly markets
#[derive(Debug, Clone)]
pub struct SignalEngine {
    gate: EdgeGate,
    sizer: KellySizer,
    default_bankroll: Decimal,
}

impl SignalEngine {
    pub fn new(gate: EdgeGate, sizer: KellySizer, default_bankroll: Decimal) -> Self {
        Self {
            gate,
            sizer,
            default_bankroll,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            EdgeGate::new(config.signal.edge_threshold),
            KellySizer::from_config(&config.risk),
            config.risk.default_bankroll_usd,
        )
    }

    /// Produce a decision and stake for one market quote
    ///
    /// The No side is sized as buying the complement at `1 - best_bid`
    /// with probability `1 - model_p`.
    pub fn run_engine(
        &self,
        snapshot: &FeatureSnapshot,
        quote: &MarketQuote,
        weights: &WeightTable,
        bankroll: Option<Decimal>,
        overrides: &SizingOverrides,
    ) -> SignalResult {
        let bankroll = bankroll
            .filter(|b| *b > Decimal::ZERO)
            .unwrap_or(self.default_bankroll);

        let composite = weighted_score(snapshot.results.values(), weights);
        let model_p = score_to_model_p(composite);
        let market_p = quote.implied_prob_yes;
        let decision = self.gate.decide(model_p, market_p, quote.best_bid);

        let sizer = match overrides.kelly_fraction {
            Some(fraction) => self.sizer.with_fraction(fraction),
            None => self.sizer.clone(),
        };

        let side = match decision.direction {
            Direction::Yes => Some((model_p, market_p)),
            Direction::No => {
                let bid = quote.best_bid.unwrap_or(market_p);
                let price_no = (Decimal::ONE - bid).clamp(MIN_PRICE, MAX_PRICE);
                Some((Decimal::ONE - model_p, price_no))
            }
            Direction::NoTrade => None,
        };

        let (kelly, recommended, warning) = match side {
            Some((p, price)) => {
                let recommended =
                    sizer.recommended_size(p, price, bankroll, quote.max_safe_size_usd, overrides.max_bet_usd);
                (
                    kelly_fraction(p, price),
                    recommended,
                    liquidity_warning(recommended, quote.max_safe_size_usd),
                )
            }
            None => (Decimal::ZERO, Decimal::ZERO, None),
        };

        let reasoning = build_reasoning(snapshot, weights);

        tracing::info!(
            direction = %decision.direction,
            composite = %composite,
            model_p = %model_p,
            market_p = %market_p,
            edge = %decision.edge,
            recommended_usd = %recommended,
            scored_sources = snapshot.scored_count(),
            "signal_generated"
        );
        telemetry::record_signal("daily", decision.direction.as_str());

        SignalResult {
            id: Uuid::new_v4(),
            market_slug: None,
            market_condition_id: None,
            direction: decision.direction,
            composite_score: composite,
            model_p,
            market_p,
            edge: decision.edge,
            edge_yes: decision.edge_yes,
            edge_no: decision.edge_no,
            kelly_fraction: kelly,
            recommended_usd: recommended,
            max_safe_size_usd: quote.max_safe_size_usd,
            reasoning,
            liquidity_warning: warning,
            user_bet_cap_usd: overrides.max_bet_usd,
            kelly_fraction_used: overrides.kelly_fraction,
            generated_at: Utc::now(),
        }
    }
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
