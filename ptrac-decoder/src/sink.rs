//! Event sinks
//!
//! Consumers of decoded records. Storage formats live outside this crate; a
//! sink only has to accept records in order and optionally react to the end
//! of the trace.

use crate::scanner::DecodeStats;
use crate::types::{EventKind, EventRecord, Result};
use std::collections::BTreeMap;

/// Receiver for decoded records
pub trait EventSink {
    /// Take ownership of the next record
    fn accept(&mut self, record: EventRecord) -> Result<()>;

    /// Called once after the last record, also when the trace was truncated
    fn finish(&mut self, _stats: &DecodeStats) -> Result<()> {
        Ok(())
    }
}

impl EventSink for Vec<EventRecord> {
    fn accept(&mut self, record: EventRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn accept(&mut self, record: EventRecord) -> Result<()> {
        (**self).accept(record)
    }

    fn finish(&mut self, stats: &DecodeStats) -> Result<()> {
        (**self).finish(stats)
    }
}

/// Adapter that turns a closure into a sink
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: FnMut(EventRecord),
{
    fn accept(&mut self, record: EventRecord) -> Result<()> {
        (self.0)(record);
        Ok(())
    }
}

/// Sink that only keeps tallies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountingSink {
    pub events: u64,
    pub completed_histories: u64,
    pub by_kind: BTreeMap<EventKind, u64>,
    pub last_history_id: Option<i64>,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: EventKind) -> u64 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

impl EventSink for CountingSink {
    fn accept(&mut self, record: EventRecord) -> Result<()> {
        self.events += 1;
        if record.ends_history() {
            self.completed_histories += 1;
        }
        *self.by_kind.entry(record.kind).or_insert(0) += 1;
        self.last_history_id = Some(record.history_id);
        Ok(())
    }
}
