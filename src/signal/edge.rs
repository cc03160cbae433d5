//! Edge gating

use super::Direction;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Outcome of the edge gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeDecision {
    pub direction: Direction,
    /// Edge of the chosen side; the Yes edge when not trading
    pub edge: Decimal,
    pub edge_yes: Decimal,
    /// Only computed when a best bid is known
    pub edge_no: Option<Decimal>,
}

/// Trades a side only when its edge reaches the threshold (inclusive)
#[derive(Debug, Clone)]
pub struct EdgeGate {
    pub threshold: Decimal,
}

impl EdgeGate {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }

    /// Decide a side from model probability, implied Yes probability, and best bid
    ///
    /// Yes is priced at the ask (`p - ask`). No is only considered with a
    /// bid, since buying No pays `1 - bid` (`bid - p`).
    pub fn decide(&self, model_p: Decimal, market_p: Decimal, best_bid: Option<Decimal>) -> EdgeDecision {
        let edge_yes = (model_p - market_p).round_dp(4);
        let edge_no = best_bid.map(|bid| (bid - model_p).round_dp(4));

        let (direction, edge) = if edge_yes >= self.threshold {
            (Direction::Yes, edge_yes)
        } else {
            match edge_no {
                Some(edge_no) if edge_no >= self.threshold => (Direction::No, edge_no),
                _ => (Direction::NoTrade, edge_yes),
            }
        };

        EdgeDecision {
            direction,
            edge,
            edge_yes,
            edge_no,
        }
    }
}

impl Default for EdgeGate {
    fn default() -> Self {
        Self::new(dec!(0.05))
    }
}
