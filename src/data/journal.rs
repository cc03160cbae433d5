//! JSON Lines journal for snapshots and signals

use crate::fetch::{FeatureSnapshot, SourceId};
use crate::signal::SignalResult;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Destination for snapshot rows and signal results
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Persist one row per source in the snapshot
    async fn record_snapshot(&self, market_slug: Option<&str>, snapshot: &FeatureSnapshot) -> anyhow::Result<()>;

    async fn record_signal(&self, signal: &SignalResult) -> anyhow::Result<()>;
}

/// One source's result at capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub captured_at: DateTime<Utc>,
    pub market_slug: Option<String>,
    pub source_id: SourceId,
    pub raw_value: Option<String>,
    pub normalized_score: Option<Decimal>,
    pub stale: bool,
    pub error: Option<String>,
}

impl SnapshotRow {
    pub fn rows(market_slug: Option<&str>, snapshot: &FeatureSnapshot) -> Vec<Self> {
        snapshot
            .results
            .values()
            .map(|r| SnapshotRow {
                captured_at: snapshot.captured_at,
                market_slug: market_slug.map(str::to_string),
                source_id: r.source_id,
                raw_value: r.raw_value.clone(),
                normalized_score: r.normalized_score,
                stale: r.stale,
                error: r.error.clone(),
            })
            .collect()
    }
}

/// A journal line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalEntry {
    Snapshot(SnapshotRow),
    Signal(Box<SignalResult>),
}

/// Append-only JSON Lines file
pub struct JsonlJournal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entries: &[JournalEntry]) -> anyhow::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut buf = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut buf, entry)?;
            buf.push(b'\n');
        }

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening journal {}", self.path.display()))?;
        file.write_all(&buf).await?;
        file.flush().await?;

        tracing::debug!(path = %self.path.display(), count = entries.len(), "journal_appended");
        Ok(())
    }

    /// Every entry written so far
    pub async fn entries(&self) -> anyhow::Result<Vec<JournalEntry>> {
        read_jsonl(&self.path).await
    }
}

#[async_trait]
impl SnapshotSink for JsonlJournal {
    async fn record_snapshot(&self, market_slug: Option<&str>, snapshot: &FeatureSnapshot) -> anyhow::Result<()> {
        let entries: Vec<JournalEntry> = SnapshotRow::rows(market_slug, snapshot)
            .into_iter()
            .map(JournalEntry::Snapshot)
            .collect();
        self.append(&entries).await
    }

    async fn record_signal(&self, signal: &SignalResult) -> anyhow::Result<()> {
        self.append(&[JournalEntry::Signal(Box::new(signal.clone()))]).await
    }
}

/// Parse a JSON Lines file, skipping blank lines
pub async fn read_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("{}:{}: invalid record", path.display(), i + 1))
        })
        .collect()
}
