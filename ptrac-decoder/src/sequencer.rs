//! Event sequencer
//!
//! Owns every cross-record counter and the in-flight record. The scanner calls
//! one mutator per classified line; a record leaves the sequencer only when its
//! detail line has been decoded, so partial triples never escape.

use crate::types::{
    DecoderError, EventKind, EventRecord, KindFields, Result, TERMINATION_MARKER,
};
use crate::schedule::ScanState;

/// Integer fields on a history header line
pub const HEADER_FIELDS: usize = 2;
/// Integer fields on an event info line
pub const INFO_FIELDS: usize = 7;
/// Float fields on an event detail line
pub const DETAIL_FIELDS: usize = 9;

/// Snapshot of the sequencer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequencerCounters {
    pub total_events: u64,
    pub total_completed_histories: u64,
    pub events_in_current_history: u64,
}

/// Info-line half of an event, waiting for its detail line
#[derive(Debug, Clone)]
struct PendingEvent {
    kind: EventKind,
    kind_code: i64,
    next_kind_code: i64,
    node_count: i64,
    fields: KindFields,
    collision_count: i64,
}

/// Cross-record state for one trace
#[derive(Debug, Default)]
pub struct EventSequencer {
    counters: SequencerCounters,
    history_id: i64,
    initial_kind: Option<EventKind>,
    initial_kind_code: Option<i64>,
    carried_kind_code: Option<i64>,
    last_history_id: Option<i64>,
    in_flight: Option<PendingEvent>,
}

impl EventSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> SequencerCounters {
        self.counters
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a new history from a header line's integer fields
    pub fn on_history_header(&mut self, line: u64, values: &[i64]) -> Result<()> {
        require(line, ScanState::HistoryHeaderLine, HEADER_FIELDS, values.len())?;
        let (history_id, code) = (values[0], values[1]);

        let initial_kind = EventKind::from_code(code)
            .ok_or(DecoderError::UnknownEventKind { line, code })?;

        if self.in_flight.take().is_some() {
            log::warn!("Line {}: history header arrived before the previous event completed", line);
        }
        if let Some(previous) = self.last_history_id {
            if history_id < previous {
                log::warn!(
                    "Line {}: history {} follows history {} (out of order)",
                    line,
                    history_id,
                    previous
                );
            }
        }

        log::debug!("History {} starts with {} (code {})", history_id, initial_kind, code);

        self.history_id = history_id;
        self.last_history_id = Some(history_id);
        self.initial_kind = Some(initial_kind);
        self.initial_kind_code = Some(code);
        self.carried_kind_code = None;
        self.counters.events_in_current_history = 0;
        Ok(())
    }

    /// Decode an event info line. Returns true if the event ends its history.
    pub fn on_event_info(&mut self, line: u64, values: &[i64]) -> Result<bool> {
        require(line, ScanState::EventInfoLine, INFO_FIELDS, values.len())?;

        // The first event of a history takes its kind from the header; later
        // ones from the previous event's next-event code.
        let kind_code = if self.counters.events_in_current_history == 0 {
            self.initial_kind_code
        } else {
            self.carried_kind_code
        }
        .unwrap_or_default();

        let kind = EventKind::from_code(kind_code)
            .ok_or(DecoderError::UnknownEventKind { line, code: kind_code })?;

        let next_kind_code = values[0];
        self.in_flight = Some(PendingEvent {
            kind,
            kind_code,
            next_kind_code,
            node_count: values[1],
            fields: KindFields::decode(kind, values),
            collision_count: values[6],
        });

        Ok(next_kind_code == TERMINATION_MARKER)
    }

    /// Complete the in-flight event with a detail line and hand it out
    pub fn on_event_detail(&mut self, line: u64, values: &[f64]) -> Result<EventRecord> {
        require(line, ScanState::EventDetailLine, DETAIL_FIELDS, values.len())?;

        let pending = self.in_flight.take().ok_or(DecoderError::MissingField {
            line,
            role: ScanState::EventInfoLine,
            expected: INFO_FIELDS,
            found: 0,
        })?;
        let initial_kind = self.initial_kind.unwrap_or(pending.kind);

        let record = EventRecord {
            history_id: self.history_id,
            kind: pending.kind,
            kind_code: pending.kind_code,
            initial_kind,
            next_kind_code: pending.next_kind_code,
            node_count: pending.node_count,
            fields: pending.fields,
            particle_type: 0,
            collision_count: pending.collision_count,
            position: [values[0], values[1], values[2]],
            direction: [values[3], values[4], values[5]],
            energy: values[6],
            weight: values[7],
            time: values[8],
        };

        self.counters.total_events += 1;
        self.counters.events_in_current_history += 1;
        if record.ends_history() {
            self.counters.total_completed_histories += 1;
            self.carried_kind_code = None;
            log::debug!(
                "History {} complete after {} events",
                self.history_id,
                self.counters.events_in_current_history
            );
        } else {
            self.carried_kind_code = Some(record.next_kind_code);
        }

        Ok(record)
    }

    /// Drop a partially decoded event. Returns true if there was one.
    pub fn discard_in_flight(&mut self) -> bool {
        self.in_flight.take().is_some()
    }
}

fn require(line: u64, role: ScanState, expected: usize, found: usize) -> Result<()> {
    if found < expected {
        return Err(DecoderError::MissingField {
            line,
            role,
            expected,
            found,
        });
    }
    Ok(())
}
