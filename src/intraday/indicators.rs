//! Technical indicators over 1-minute candles

use crate::fetch::Candle;
use serde::{Deserialize, Serialize};

/// Cumulative VWAP over the whole window; None without volume
pub fn session_vwap(candles: &[Candle]) -> Option<f64> {
    let (pv, v) = candles
        .iter()
        .fold((0.0, 0.0), |(pv, v), c| (pv + c.typical_price() * c.volume, v + c.volume));
    (v > 0.0).then(|| pv / v)
}

/// Cumulative VWAP at each bar; bars before any volume use the typical price
pub fn vwap_series(candles: &[Candle]) -> Vec<f64> {
    let mut pv = 0.0;
    let mut v = 0.0;
    candles
        .iter()
        .map(|c| {
            pv += c.typical_price() * c.volume;
            v += c.volume;
            if v > 0.0 {
                pv / v
            } else {
                c.typical_price()
            }
        })
        .collect()
}

/// Simple-average RSI over the last `period` changes
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    let start = closes.len() - period;
    let (gains, losses) = (start..closes.len()).fold((0.0, 0.0), |(g, l), i| {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            (g + change, l)
        } else {
            (g, l - change)
        }
    });
    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// RSI at every bar that has enough history
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    (period + 1..=closes.len())
        .filter_map(|end| rsi(&closes[..end], period))
        .collect()
}

/// Average change per step across the last `n` values
pub fn slope(series: &[f64], n: usize) -> Option<f64> {
    if n == 0 || series.len() < n {
        return None;
    }
    let tail = &series[series.len() - n..];
    Some((tail[n - 1] - tail[0]) / n as f64)
}

/// EMA seeded with the SMA of the first `period` values
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    for value in &values[period..] {
        let prev = out[out.len() - 1];
        out.push((value - prev) * k + prev);
    }
    out
}

/// MACD at the last bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if closes.len() < slow + signal {
        return None;
    }
    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);
    if ema_slow.is_empty() || ema_fast.len() < ema_slow.len() {
        return None;
    }
    let offset = ema_fast.len() - ema_slow.len();
    let line: Vec<f64> = ema_slow
        .iter()
        .enumerate()
        .map(|(i, slow)| ema_fast[offset + i] - slow)
        .collect();
    let signal_line = ema(&line, signal);
    let (&line, &signal) = (line.last()?, signal_line.last()?);
    Some(Macd {
        line,
        signal,
        histogram: line - signal,
    })
}

/// Heiken-Ashi candle color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HaColor {
    Green,
    Red,
}

fn ha_color(prev: &Candle, bar: &Candle) -> HaColor {
    let ha_close = (bar.open + bar.high + bar.low + bar.close) / 4.0;
    let ha_open = (prev.open + prev.close) / 2.0;
    if ha_close >= ha_open {
        HaColor::Green
    } else {
        HaColor::Red
    }
}

/// Color of the last Heiken-Ashi bar
pub fn heiken_ashi_color(candles: &[Candle]) -> Option<HaColor> {
    match candles {
        [.., prev, last] => Some(ha_color(prev, last)),
        _ => None,
    }
}

/// Consecutive bars at the end sharing the last bar's color
pub fn heiken_ashi_run(candles: &[Candle]) -> usize {
    let colors: Vec<HaColor> = candles.windows(2).map(|w| ha_color(&w[0], &w[1])).collect();
    let Some(last) = colors.last() else {
        return 0;
    };
    colors.iter().rev().take_while(|c| *c == last).count()
}

/// Price was above VWAP one bar ago and has dropped back below it
pub fn failed_vwap_reclaim(closes: &[f64], vwap_now: f64, vwap_series: &[f64]) -> bool {
    if vwap_series.len() < 3 || closes.len() < 2 {
        return false;
    }
    closes[closes.len() - 1] < vwap_now && closes[closes.len() - 2] > vwap_series[vwap_series.len() - 2]
}
