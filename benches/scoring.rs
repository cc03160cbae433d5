//! Benchmarks for composite scoring and the intraday TA path

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use poly_signal::fetch::{Candle, FeatureSnapshot, FetchResult, SourceId};
use poly_signal::intraday::{compute_indicators, IntradayEngine};
use poly_signal::market::{MarketQuote, UpDownQuote};
use poly_signal::signal::{weighted_score, SignalEngine, SizingOverrides, WeightTable};
use rust_decimal_macros::dec;

fn snapshot() -> FeatureSnapshot {
    FeatureSnapshot::new(vec![
        FetchResult::scored(SourceId::EtfFlows, "350.0", dec!(2), false),
        FetchResult::scored(SourceId::Funding, "0.0001", dec!(0), false),
        FetchResult::scored(SourceId::Dxy, "-0.42", dec!(1), false),
        FetchResult::scored(SourceId::FearGreed, "72", dec!(-1), false),
        FetchResult::scored(SourceId::PriceMa, "3.10", dec!(0.5), false),
        FetchResult::failed(SourceId::ExchangeNetflow, "no_api_key"),
        FetchResult::scored(SourceId::Macro, "no_event", dec!(0.5), false),
    ])
}

fn candles(bars: usize) -> Vec<Candle> {
    let mut price = 60_000.0_f64;
    (0..bars)
        .map(|i| {
            let open = price;
            price += (i as f64 * 0.7).sin() * 25.0 + 3.0;
            Candle {
                open_time: i as i64 * 60_000,
                open,
                high: open.max(price) + 4.0,
                low: open.min(price) - 4.0,
                close: price,
                volume: 1.5 + (i % 7) as f64,
                close_time: Some(i as i64 * 60_000 + 59_999),
            }
        })
        .collect()
}

fn benchmark_weighted_score(c: &mut Criterion) {
    let snapshot = snapshot();
    let weights = WeightTable::default();

    c.bench_function("weighted_score", |b| {
        b.iter(|| weighted_score(black_box(snapshot.results.values()), black_box(&weights)))
    });
}

fn benchmark_run_engine(c: &mut Criterion) {
    let engine = SignalEngine::default();
    let snapshot = snapshot();
    let weights = WeightTable::default();
    let quote = MarketQuote::new(Some(dec!(0.40)), dec!(0.42), dec!(800));
    let overrides = SizingOverrides::default();

    c.bench_function("run_engine", |b| {
        b.iter(|| engine.run_engine(black_box(&snapshot), black_box(&quote), &weights, None, &overrides))
    });
}

fn benchmark_intraday(c: &mut Criterion) {
    let bars = candles(240);
    let engine = IntradayEngine::default();
    let quote = UpDownQuote::from_prices(dec!(0.52), dec!(0.50), dec!(300), dec!(300));

    c.bench_function("compute_indicators_240", |b| b.iter(|| compute_indicators(black_box(&bars))));
    c.bench_function("run_engine_15m_240", |b| {
        b.iter(|| engine.run_engine_15m(black_box(&quote), Some(8.0), dec!(1000), black_box(&bars)))
    });
}

criterion_group!(benches, benchmark_weighted_score, benchmark_run_engine, benchmark_intraday);
criterion_main!(benches);
