//! Stats command implementation

use super::{print_json, OutputFormat};
use crate::analytics::{ResolvedRun, StatsSummary};
use crate::data::read_jsonl;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// JSON Lines file of resolved runs
    #[arg(long, default_value = "./data/resolved_runs.jsonl")]
    pub runs: PathBuf,

    /// First day to include (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl StatsArgs {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let runs: Vec<ResolvedRun> = read_jsonl(&self.runs).await?;
        let range = self.from.zip(self.to);
        if let Some((from, to)) = range {
            anyhow::ensure!(from <= to, "--from {from} is after --to {to}");
        }
        tracing::info!(path = %self.runs.display(), runs = runs.len(), "resolved_runs_loaded");

        let summary = StatsSummary::from_runs(&runs, range);
        match self.format {
            OutputFormat::Json => print_json(&summary)?,
            OutputFormat::Table => print!("{}", summary.format_table()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn runs_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"run_at":"2025-03-01T12:00:00Z","model_p":"0.64","outcome":"WIN"}}"#).unwrap();
        writeln!(file, r#"{{"run_at":"2025-03-02T12:00:00Z","model_p":"0.71","outcome":"LOSS"}}"#).unwrap();
        file
    }

    fn args(runs: PathBuf, from: Option<&str>, to: Option<&str>) -> StatsArgs {
        StatsArgs {
            runs,
            from: from.map(|d| d.parse().unwrap()),
            to: to.map(|d| d.parse().unwrap()),
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn test_stats_over_file() {
        let file = runs_file();
        tokio_test::assert_ok!(tokio_test::block_on(args(file.path().to_path_buf(), None, None).execute()));
    }

    #[test]
    fn test_stats_rejects_inverted_range() {
        let file = runs_file();
        let result = tokio_test::block_on(args(file.path().to_path_buf(), Some("2025-03-05"), Some("2025-03-01")).execute());
        assert!(result.is_err());
    }

    #[test]
    fn test_stats_missing_file() {
        let result = tokio_test::block_on(args(PathBuf::from("/nonexistent/runs.jsonl"), None, None).execute());
        assert!(result.is_err());
    }
}
