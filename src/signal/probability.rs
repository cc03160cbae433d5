//! Composite score to model probability

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Model probability floor; the model never claims near-certainty
pub const MIN_MODEL_P: Decimal = dec!(0.15);
/// Model probability ceiling
pub const MAX_MODEL_P: Decimal = dec!(0.85);

/// Linear map of a score in [-2, 2] onto [0.15, 0.85], rounded to 4 decimals
pub fn score_to_model_p(score: Decimal) -> Decimal {
    if score <= dec!(-2) {
        return MIN_MODEL_P;
    }
    if score >= dec!(2) {
        return MAX_MODEL_P;
    }
    let span = MAX_MODEL_P - MIN_MODEL_P;
    (MIN_MODEL_P + (score + dec!(2)) / dec!(4) * span).round_dp(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_points() {
        assert_eq!(score_to_model_p(dec!(-2)), dec!(0.15));
        assert_eq!(score_to_model_p(dec!(0)), dec!(0.50));
        assert_eq!(score_to_model_p(dec!(2)), dec!(0.85));
        assert_eq!(score_to_model_p(dec!(1)), dec!(0.675));
    }

    #[test]
    fn test_clamped_outside_range() {
        assert_eq!(score_to_model_p(dec!(-7)), MIN_MODEL_P);
        assert_eq!(score_to_model_p(dec!(3.5)), MAX_MODEL_P);
    }

    #[test]
    fn test_monotonic_and_bounded() {
        let mut previous = Decimal::MIN;
        let mut score = dec!(-3);
        while score <= dec!(3) {
            let p = score_to_model_p(score);
            assert!(p >= MIN_MODEL_P && p <= MAX_MODEL_P);
            assert!(p >= previous);
            previous = p;
            score += dec!(0.05);
        }
    }
}
