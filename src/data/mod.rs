//! Persistence module
//!
//! Appends feature snapshots and signal results to a JSON Lines journal
//! for later calibration

mod journal;

pub use journal::{read_jsonl, JournalEntry, JsonlJournal, SnapshotRow, SnapshotSink};
