//! Aggregate statistics over resolved runs

use super::{OutcomeLabel, ResolvedRun};
use crate::fetch::SourceId;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

/// Default calibration bucket width
pub const BUCKET_SIZE: Decimal = dec!(0.1);

/// Predicted vs realized win rate for one model_p bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationBucket {
    pub low: Decimal,
    pub high: Decimal,
    /// Bucket midpoint
    pub predicted: Decimal,
    pub actual: Decimal,
    pub count: usize,
}

/// Bucket decided runs by model_p; runs without a probability are ignored
pub fn calibration(runs: &[ResolvedRun], bucket_size: Decimal) -> Vec<CalibrationBucket> {
    if bucket_size <= Decimal::ZERO {
        return Vec::new();
    }
    let mut buckets: BTreeMap<Decimal, (usize, usize)> = BTreeMap::new();
    for run in runs.iter().filter(|r| r.outcome.is_decided()) {
        let Some(p) = run.model_p else {
            continue;
        };
        let low = (p / bucket_size).floor() * bucket_size;
        let entry = buckets.entry(low.normalize()).or_default();
        entry.1 += 1;
        if run.outcome == OutcomeLabel::Win {
            entry.0 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(low, (wins, count))| {
            let high = low + bucket_size;
            CalibrationBucket {
                low,
                high,
                predicted: ((low + high) / dec!(2)).round_dp(2),
                actual: (Decimal::from(wins) / Decimal::from(count)).round_dp(2),
                count,
            }
        })
        .collect()
}

/// Mean |predicted - actual| across buckets
pub fn calibration_error(buckets: &[CalibrationBucket]) -> Option<Decimal> {
    if buckets.is_empty() {
        return None;
    }
    let total: Decimal = buckets.iter().map(|b| (b.predicted - b.actual).abs()).sum();
    Some(total / Decimal::from(buckets.len()))
}

/// Wins and losses, skips excluded
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WinRate {
    pub wins: usize,
    pub losses: usize,
    pub total: usize,
    pub win_rate: Decimal,
}

pub fn win_rate(runs: &[ResolvedRun]) -> WinRate {
    let wins = runs.iter().filter(|r| r.outcome == OutcomeLabel::Win).count();
    let losses = runs.iter().filter(|r| r.outcome == OutcomeLabel::Loss).count();
    let total = wins + losses;
    let win_rate = if total > 0 {
        (Decimal::from(wins) / Decimal::from(total)).round_dp(4)
    } else {
        Decimal::ZERO
    };
    WinRate {
        wins,
        losses,
        total,
        win_rate,
    }
}

fn chronological(runs: &[ResolvedRun]) -> Vec<&ResolvedRun> {
    let mut ordered: Vec<&ResolvedRun> = runs.iter().filter(|r| r.outcome.is_decided()).collect();
    ordered.sort_by_key(|r| r.run_at);
    ordered
}

/// Longest run of consecutive losses
pub fn max_consecutive_losses(runs: &[ResolvedRun]) -> usize {
    let mut worst = 0;
    let mut current = 0;
    for run in chronological(runs) {
        if run.outcome == OutcomeLabel::Loss {
            current += 1;
            worst = worst.max(current);
        } else {
            current = 0;
        }
    }
    worst
}

/// Current streak from the latest run: positive for wins, negative for losses
pub fn current_streak(runs: &[ResolvedRun]) -> i64 {
    let ordered = chronological(runs);
    let Some(latest) = ordered.last().map(|r| r.outcome) else {
        return 0;
    };
    let length = ordered.iter().rev().take_while(|r| r.outcome == latest).count() as i64;
    if latest == OutcomeLabel::Win {
        length
    } else {
        -length
    }
}

/// Average contribution of a factor on wins vs losses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorAttribution {
    pub factor: SourceId,
    pub avg_win: Option<Decimal>,
    pub avg_loss: Option<Decimal>,
    pub count_win: usize,
    pub count_loss: usize,
}

pub fn factor_attribution(runs: &[ResolvedRun]) -> Vec<FactorAttribution> {
    let mut sums: BTreeMap<SourceId, [(Decimal, usize); 2]> = BTreeMap::new();
    for run in runs.iter().filter(|r| r.outcome.is_decided()) {
        let slot = usize::from(run.outcome == OutcomeLabel::Loss);
        for factor in &run.reasoning {
            let Some(contribution) = factor.contribution else {
                continue;
            };
            let entry = &mut sums.entry(factor.factor).or_default()[slot];
            entry.0 += contribution;
            entry.1 += 1;
        }
    }

    let average = |(sum, n): (Decimal, usize)| (n > 0).then(|| (sum / Decimal::from(n)).round_dp(4));
    sums.into_iter()
        .map(|(factor, [win, loss])| FactorAttribution {
            factor,
            avg_win: average(win),
            avg_loss: average(loss),
            count_win: win.1,
            count_loss: loss.1,
        })
        .collect()
}

/// Runs whose run_at falls on a day in `[from, to]`
pub fn filter_date_range(runs: &[ResolvedRun], from: NaiveDate, to: NaiveDate) -> Vec<ResolvedRun> {
    let start = Utc.from_utc_datetime(&from.and_time(NaiveTime::MIN));
    let end = to
        .succ_opt()
        .map(|next| Utc.from_utc_datetime(&next.and_time(NaiveTime::MIN)));
    runs.iter()
        .filter(|r| r.run_at >= start && end.map_or(true, |end| r.run_at < end))
        .cloned()
        .collect()
}

/// Everything the stats command reports
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub runs: usize,
    pub win_rate: WinRate,
    pub calibration: Vec<CalibrationBucket>,
    pub calibration_error: Option<Decimal>,
    pub max_consecutive_losses: usize,
    pub current_streak: i64,
    pub attribution: Vec<FactorAttribution>,
}

impl StatsSummary {
    /// Summarize all runs, or only those inside an inclusive date range
    pub fn from_runs(runs: &[ResolvedRun], range: Option<(NaiveDate, NaiveDate)>) -> Self {
        let selected = match range {
            Some((from, to)) => filter_date_range(runs, from, to),
            None => runs.to_vec(),
        };
        let buckets = calibration(&selected, BUCKET_SIZE);
        Self {
            date_from: range.map(|r| r.0),
            date_to: range.map(|r| r.1),
            runs: selected.len(),
            win_rate: win_rate(&selected),
            calibration_error: calibration_error(&buckets),
            calibration: buckets,
            max_consecutive_losses: max_consecutive_losses(&selected),
            current_streak: current_streak(&selected),
            attribution: factor_attribution(&selected),
        }
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let range = match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => format!("{from} .. {to}"),
            _ => "all runs".to_string(),
        };
        let calibration_error = self
            .calibration_error
            .map(|e| format!("{:.1}%", e * dec!(100)))
            .unwrap_or_else(|| "no calibration data yet".to_string());

        let mut out = format!(
            r#"
══════════════════════════════════════════════════════
               SIGNAL STATS ({range})
══════════════════════════════════════════════════════

PERFORMANCE
───────────────────────────────────────────────────────
Runs:             {}
Wins / Losses:    {} / {}
Win Rate:         {:.1}%
Max Loss Streak:  {}
Current Streak:   {:+}
Avg Calib Error:  {calibration_error}
"#,
            self.runs,
            self.win_rate.wins,
            self.win_rate.losses,
            self.win_rate.win_rate * dec!(100),
            self.max_consecutive_losses,
            self.current_streak,
        );

        if !self.calibration.is_empty() {
            out.push_str("\nCALIBRATION\n───────────────────────────────────────────────────────\n");
            for b in &self.calibration {
                out.push_str(&format!(
                    "{:.1}-{:.1}  predicted {:.2}  actual {:.2}  n={}\n",
                    b.low, b.high, b.predicted, b.actual, b.count
                ));
            }
        }
        if !self.attribution.is_empty() {
            out.push_str("\nFACTORS (avg contribution win / loss)\n───────────────────────────────────────────────────────\n");
            let show = |v: Option<Decimal>| v.map(|v| format!("{v:+.4}")).unwrap_or_else(|| "-".to_string());
            for a in &self.attribution {
                out.push_str(&format!(
                    "{:<20} {:>8} / {:<8} ({}W {}L)\n",
                    a.factor.as_str(),
                    show(a.avg_win),
                    show(a.avg_loss),
                    a.count_win,
                    a.count_loss
                ));
            }
        }
        out.push_str("══════════════════════════════════════════════════════\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::FactorContribution;
    use chrono::{DateTime, Duration};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn run(day: i64, model_p: Decimal, outcome: OutcomeLabel) -> ResolvedRun {
        ResolvedRun {
            run_at: base() + Duration::days(day),
            model_p: Some(model_p),
            outcome,
            direction: None,
            reasoning: Vec::new(),
        }
    }

    fn sample() -> Vec<ResolvedRun> {
        use OutcomeLabel::*;
        vec![
            run(0, dec!(0.62), Win),
            run(1, dec!(0.65), Loss),
            run(2, dec!(0.68), Loss),
            run(3, dec!(0.71), Loss),
            run(4, dec!(0.55), Skip),
            run(5, dec!(0.74), Win),
            run(6, dec!(0.79), Win),
        ]
    }

    #[test]
    fn test_win_rate_excludes_skips() {
        let wr = win_rate(&sample());
        assert_eq!((wr.wins, wr.losses, wr.total), (3, 3, 6));
        assert_eq!(wr.win_rate, dec!(0.5));
        assert_eq!(win_rate(&[]).win_rate, dec!(0));
    }

    #[test]
    fn test_streaks() {
        let runs = sample();
        assert_eq!(max_consecutive_losses(&runs), 3);
        assert_eq!(current_streak(&runs), 2);
        assert_eq!(current_streak(&runs[..3]), -2);
        assert_eq!(current_streak(&[]), 0);
    }

    #[test]
    fn test_streaks_use_run_order() {
        let mut runs = sample();
        runs.reverse();
        assert_eq!(current_streak(&runs), 2);
    }

    #[test]
    fn test_calibration_buckets() {
        let buckets = calibration(&sample(), BUCKET_SIZE);
        assert_eq!(buckets.len(), 2);
        let sixties = &buckets[0];
        assert_eq!(sixties.low, dec!(0.6));
        assert_eq!(sixties.predicted, dec!(0.65));
        assert_eq!(sixties.count, 3);
        assert_eq!(sixties.actual, dec!(0.33));
        let seventies = &buckets[1];
        assert_eq!(seventies.count, 3);
        assert_eq!(seventies.actual, dec!(0.67));
        // |0.65 - 0.33| and |0.75 - 0.67|
        assert_eq!(calibration_error(&buckets), Some(dec!(0.20)));
        assert!(calibration_error(&[]).is_none());
    }

    #[test]
    fn test_factor_attribution() {
        let factor = |source, c: Decimal| FactorContribution {
            factor: source,
            raw_value: None,
            weight: dec!(0.25),
            contribution: Some(c),
            stale: false,
            error: None,
        };
        let mut runs = sample();
        runs[0].reasoning = vec![factor(SourceId::EtfFlows, dec!(0.5))];
        runs[1].reasoning = vec![factor(SourceId::EtfFlows, dec!(-0.25))];
        runs[5].reasoning = vec![factor(SourceId::EtfFlows, dec!(0.25)), factor(SourceId::Dxy, dec!(0.1))];
        runs[4].reasoning = vec![factor(SourceId::Macro, dec!(1))];

        let attribution = factor_attribution(&runs);
        assert_eq!(attribution.len(), 2);
        let etf = attribution.iter().find(|a| a.factor == SourceId::EtfFlows).unwrap();
        assert_eq!(etf.avg_win, Some(dec!(0.375)));
        assert_eq!(etf.avg_loss, Some(dec!(-0.25)));
        assert_eq!((etf.count_win, etf.count_loss), (2, 1));
        let dxy = attribution.iter().find(|a| a.factor == SourceId::Dxy).unwrap();
        assert!(dxy.avg_loss.is_none());
    }

    #[test]
    fn test_date_range_inclusive() {
        let runs = sample();
        let from = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let summary = StatsSummary::from_runs(&runs, Some((from, to)));
        assert_eq!(summary.runs, 3);
        assert_eq!(summary.win_rate.losses, 3);
        assert_eq!(summary.current_streak, -3);
        let table = summary.format_table();
        assert!(table.contains("2025-03-02 .. 2025-03-04"));
        assert!(table.contains("Win Rate:         0.0%"));
    }
}
