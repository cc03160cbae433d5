//! End-to-end engine scenarios over fixed snapshots and quotes

use poly_signal::analytics::{grade, ActualResult, OutcomeLabel};
use poly_signal::fetch::{Candle, FeatureSnapshot, FetchResult, SourceId};
use poly_signal::intraday::{Direction15m, IntradayEngine, Phase};
use poly_signal::market::{MarketQuote, UpDownQuote};
use poly_signal::orderbook::{OrderBook, PriceLevel};
use poly_signal::risk::KellySizer;
use poly_signal::signal::{
    score_to_model_p, Direction, EdgeGate, SignalEngine, SizingOverrides, WeightTable,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn single_source(score: Decimal) -> (FeatureSnapshot, WeightTable) {
    let snapshot = FeatureSnapshot::new(vec![
        FetchResult::scored(SourceId::EtfFlows, "350.0", score, false),
        FetchResult::failed(SourceId::Dxy, "HTTP 503 from https://example"),
        FetchResult::failed(SourceId::Macro, "circuit_open"),
    ]);
    let weights = WeightTable::new([
        (SourceId::EtfFlows, dec!(1.0)),
        (SourceId::Dxy, dec!(0.5)),
        (SourceId::Macro, dec!(0.5)),
    ]);
    (snapshot, weights)
}

#[test]
fn test_yes_signal_capped_by_bankroll_pct() {
    let gate = EdgeGate::new(dec!(0.05));
    let decision = gate.decide(dec!(0.70), dec!(0.60), None);
    assert_eq!(decision.direction, Direction::Yes);
    assert_eq!(decision.edge, dec!(0.10));

    let sizer = KellySizer::new(dec!(0.25), dec!(0.05));
    let size = sizer.recommended_size(dec!(0.70), dec!(0.60), dec!(1000), dec!(500), None);
    assert_eq!(size, dec!(50));
}

#[test]
fn test_single_source_renormalizes_to_full_score() {
    let (snapshot, weights) = single_source(dec!(2));
    let quote = MarketQuote::new(Some(dec!(0.58)), dec!(0.60), dec!(500));

    let result = SignalEngine::default().run_engine(&snapshot, &quote, &weights, Some(dec!(1000)), &SizingOverrides::default());

    assert_eq!(result.composite_score, dec!(2));
    assert_eq!(result.model_p, score_to_model_p(dec!(2)));
    assert_eq!(result.direction, Direction::Yes);
    assert_eq!(result.recommended_usd, dec!(50));
    assert!(result.liquidity_warning.is_none());
    assert_eq!(result.reasoning.missing, vec![SourceId::Dxy, SourceId::Macro]);
    assert!(result.reasoning.summary.contains("Missing: dxy, macro"));
}

#[test]
fn test_no_signal_limited_by_depth() {
    let (snapshot, weights) = single_source(dec!(-2));
    let quote = MarketQuote::new(Some(dec!(0.28)), dec!(0.30), dec!(40));

    let result = SignalEngine::default().run_engine(&snapshot, &quote, &weights, None, &SizingOverrides::default());

    assert_eq!(result.direction, Direction::No);
    assert_eq!(result.edge_no, Some(dec!(0.13)));
    assert_eq!(result.recommended_usd, dec!(40));
    assert_eq!(result.liquidity_warning.as_deref(), Some("Thin liquidity. Max safe size: $40"));
}

#[test]
fn test_user_cap_and_kelly_override() {
    let (snapshot, weights) = single_source(dec!(2));
    let quote = MarketQuote::new(None, dec!(0.60), dec!(500));
    let overrides = SizingOverrides {
        max_bet_usd: Some(dec!(12.5)),
        kelly_fraction: Some(dec!(0.1)),
    };

    let result = SignalEngine::default().run_engine(&snapshot, &quote, &weights, Some(dec!(1000)), &overrides);

    assert_eq!(result.direction, Direction::Yes);
    assert_eq!(result.recommended_usd, dec!(12.5));
    assert_eq!(result.user_bet_cap_usd, Some(dec!(12.5)));
    assert_eq!(result.kelly_fraction_used, Some(dec!(0.1)));
}

#[test]
fn test_all_sources_failed_is_neutral() {
    let snapshot = FeatureSnapshot::new(SourceId::ALL.map(|id| FetchResult::failed(id, "timeout")));
    let quote = MarketQuote::new(Some(dec!(0.48)), dec!(0.50), dec!(500));

    let result = SignalEngine::default().run_engine(
        &snapshot,
        &quote,
        &WeightTable::default(),
        None,
        &SizingOverrides::default(),
    );

    assert_eq!(result.composite_score, Decimal::ZERO);
    assert_eq!(result.model_p, dec!(0.5));
    assert_eq!(result.direction, Direction::NoTrade);
    assert_eq!(result.recommended_usd, Decimal::ZERO);
}

#[test]
fn test_quote_from_book_feeds_engine() {
    let book = OrderBook::from_levels(
        "yes-token",
        vec![PriceLevel::new(dec!(0.40), dec!(1000))],
        vec![
            PriceLevel::new(dec!(0.42), dec!(100)),
            PriceLevel::new(dec!(0.60), dec!(1000)),
        ],
    );
    let quote = MarketQuote::from_book(&book, dec!(0.01)).unwrap();
    assert_eq!(quote.implied_prob_yes, dec!(0.42));
    assert_eq!(quote.max_safe_size_usd, dec!(42));

    let (snapshot, weights) = single_source(dec!(2));
    let result = SignalEngine::default().run_engine(&snapshot, &quote, &weights, None, &SizingOverrides::default());
    assert_eq!(result.direction, Direction::Yes);
    assert_eq!(result.recommended_usd, dec!(42));
    assert!(result.liquidity_warning.is_some());
}

#[test]
fn test_graded_outcome() {
    let (snapshot, weights) = single_source(dec!(2));
    let quote = MarketQuote::new(Some(dec!(0.58)), dec!(0.60), dec!(500));
    let result = SignalEngine::default().run_engine(&snapshot, &quote, &weights, None, &SizingOverrides::default());

    assert_eq!(grade(result.direction, ActualResult::Yes), OutcomeLabel::Win);
    assert_eq!(grade(result.direction, ActualResult::No), OutcomeLabel::Loss);
}

fn rising_candles(bars: usize) -> Vec<Candle> {
    let mut price = 60_000.0;
    (0..bars)
        .map(|i| {
            let open = price;
            price += 6.0 + i as f64 * 0.25;
            Candle {
                open_time: i as i64 * 60_000,
                open,
                high: price + 1.0,
                low: open - 1.0,
                close: price,
                volume: 3.0,
                close_time: Some(i as i64 * 60_000 + 59_999),
            }
        })
        .collect()
}

#[test]
fn test_intraday_decays_to_neutral_at_close() {
    let quote = UpDownQuote::from_prices(dec!(0.30), dec!(0.70), dec!(500), dec!(500));
    let result = IntradayEngine::default().run_engine_15m(&quote, Some(0.0), dec!(1000), &rising_candles(60));

    assert!(result.raw_up.is_some());
    assert_eq!(result.model_up, dec!(0.5));
    assert_eq!(result.phase, Phase::Late);
    assert_eq!(result.direction, Direction15m::NoTrade);
    assert_eq!(result.recommended_usd, Decimal::ZERO);
}

#[test]
fn test_intraday_insufficient_history() {
    let quote = UpDownQuote::from_prices(dec!(0.30), dec!(0.70), dec!(500), dec!(500));
    let result = IntradayEngine::default().run_engine_15m(&quote, Some(12.0), dec!(1000), &rising_candles(10));

    assert_eq!(result.direction, Direction15m::NoTrade);
    assert_eq!(result.recommended_usd, Decimal::ZERO);
    assert!(result.indicators.is_none());
    assert!(result.note.is_some());
}
