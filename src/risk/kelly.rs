//! Fractional Kelly sizing for binary outcomes

use crate::config::RiskConfig;
use rust_decimal::{Decimal, RoundingStrategy};

/// Full-Kelly fraction for buying a side priced at `price` with win probability `p`
///
/// Shares pay $1 if correct, $0 if wrong, so net odds are
/// b = (1 - price) / price and f* = (p*b - q) / b = p - (1 - p) * price / (1 - price).
/// Clamped to [0, 1]; zero when the price is not strictly inside (0, 1).
pub fn kelly_fraction(p: Decimal, price: Decimal) -> Decimal {
    if price <= Decimal::ZERO || price >= Decimal::ONE {
        return Decimal::ZERO;
    }
    let f = p - (Decimal::ONE - p) * price / (Decimal::ONE - price);
    f.clamp(Decimal::ZERO, Decimal::ONE)
}

/// Kelly sizer capped by bankroll percentage and liquidity
#[derive(Debug, Clone)]
pub struct KellySizer {
    /// Kelly multiplier (e.g., 0.25 for quarter Kelly)
    pub fraction: Decimal,
    /// Maximum stake as a fraction of bankroll
    pub max_bankroll_pct: Decimal,
}

impl KellySizer {
    pub fn new(fraction: Decimal, max_bankroll_pct: Decimal) -> Self {
        Self {
            fraction,
            max_bankroll_pct,
        }
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(config.kelly_fraction, config.max_bankroll_pct)
    }

    /// Same caps with a different Kelly multiplier
    pub fn with_fraction(&self, fraction: Decimal) -> Self {
        Self::new(fraction, self.max_bankroll_pct)
    }

    /// Recommended stake in USD, rounded down to cents
    ///
    /// The smallest of the fractional Kelly stake, the bankroll cap, the
    /// liquidity depth, and the caller's cap (ignored unless positive).
    pub fn recommended_size(
        &self,
        p: Decimal,
        price: Decimal,
        bankroll: Decimal,
        max_safe_size: Decimal,
        user_cap: Option<Decimal>,
    ) -> Decimal {
        let size_kelly = bankroll * kelly_fraction(p, price) * self.fraction;
        let size_cap = bankroll * self.max_bankroll_pct;

        let mut size = size_kelly.min(size_cap).min(max_safe_size);
        if let Some(cap) = user_cap.filter(|c| *c > Decimal::ZERO) {
            size = size.min(cap);
        }

        size.round_dp_with_strategy(2, RoundingStrategy::ToZero)
            .max(Decimal::ZERO)
    }
}

impl Default for KellySizer {
    fn default() -> Self {
        Self::from_config(&RiskConfig::default())
    }
}
