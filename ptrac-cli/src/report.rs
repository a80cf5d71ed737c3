//! Run summary report
//!
//! JSON document describing every decoded file: decoder counters, what the
//! cuts kept per event kind, and the error that ended the file, if any.

use chrono::{SecondsFormat, Utc};
use ptrac_decoder::{DecodeStats, EventKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Outcome of decoding one file
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileReport {
    pub path: String,
    pub stats: DecodeStats,
    pub kept_events: u64,
    pub rejected_events: u64,
    pub kept_completed_histories: u64,
    /// Kept events per kind, keyed by PTRAC label
    pub by_kind: BTreeMap<&'static str, u64>,
    pub title: Vec<String>,
    /// True if `--max-events` stopped the decode early
    pub limited: bool,
    pub error: Option<String>,
}

impl FileReport {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.display().to_string(),
            ..Default::default()
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub files: usize,
    pub failed_files: usize,
    pub total_events: u64,
    pub total_completed_histories: u64,
    pub kept_events: u64,
    pub discarded_events: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub version: &'static str,
    pub decoder_version: &'static str,
    pub totals: Totals,
    pub files: Vec<FileReport>,
}

impl RunSummary {
    pub fn new(files: Vec<FileReport>) -> Self {
        let mut totals = Totals {
            files: files.len(),
            ..Default::default()
        };
        for file in &files {
            if file.failed() {
                totals.failed_files += 1;
            }
            totals.total_events += file.stats.total_events;
            totals.total_completed_histories += file.stats.total_completed_histories;
            totals.kept_events += file.kept_events;
            totals.discarded_events += file.stats.discarded_events;
        }

        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            version: env!("CARGO_PKG_VERSION"),
            decoder_version: ptrac_decoder::VERSION,
            totals,
            files,
        }
    }
}

/// Label map with every kind present, zero counts included
pub fn kind_counts(count: impl Fn(EventKind) -> u64) -> BTreeMap<&'static str, u64> {
    EventKind::ALL
        .iter()
        .map(|kind| (kind.label(), count(*kind)))
        .collect()
}
