//! Trace scanner
//!
//! Line-numbered driver that ties the schedule, tokenizer and sequencer
//! together. Each call to [`TraceScanner::feed_line`] classifies one line,
//! decodes it and returns a record when that line completed an event.
//!
//! Per-record errors put the scanner into resync mode: lines are skipped until
//! one has the shape of a history header, and the schedule is re-anchored
//! there. A header is any line of strict integers that is too short to be an
//! event info line and whose second field is a known event code; MCNP may
//! append extra fields after the history number and initial event code.

use crate::config::DecoderConfig;
use crate::schedule::{EndOfInput, LineSchedule, ScanState};
use crate::sequencer::{EventSequencer, SequencerCounters, HEADER_FIELDS, INFO_FIELDS};
use crate::tokenizer::{self, TokenMode};
use crate::types::{DecoderError, EventKind, EventRecord, Result};
use serde::{Deserialize, Serialize};

/// Lines before the first history, kept for callers that need them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preamble {
    /// Title and code-version lines
    pub title: Vec<String>,
    /// Raw filter-info lines
    pub filter_lines: Vec<String>,
    /// Variable counts per event type
    pub variable_counts: Vec<i64>,
    /// Declared variable ids, in order
    pub variable_ids: Vec<i64>,
}

/// Counters describing one decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeStats {
    /// Lines consumed, blank lines included
    pub lines_read: u64,
    /// Records emitted
    pub total_events: u64,
    /// Records whose next-event code closed their history
    pub total_completed_histories: u64,
    /// Events dropped because their info or detail line was unusable
    pub discarded_events: u64,
    /// Lines skipped while resynchronizing
    pub skipped_lines: u64,
    /// Per-record errors reported and recovered from
    pub recovered_errors: u64,
    /// The trace ended before a history header was found after an error
    pub ended_while_resyncing: bool,
}

/// Streaming PTRAC scanner for a single trace
#[derive(Debug)]
pub struct TraceScanner {
    token_mode: TokenMode,
    schedule: LineSchedule,
    sequencer: EventSequencer,
    preamble: Preamble,
    lines_read: u64,
    current_role: Option<ScanState>,
    resyncing: bool,
    ended_while_resyncing: bool,
    discarded_events: u64,
    skipped_lines: u64,
    recovered_errors: u64,
}

impl TraceScanner {
    /// Create a scanner with all counters at zero
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            token_mode: config.token_mode,
            schedule: LineSchedule::new(config.layout()),
            sequencer: EventSequencer::new(),
            preamble: Preamble::default(),
            lines_read: 0,
            current_role: None,
            resyncing: false,
            ended_while_resyncing: false,
            discarded_events: 0,
            skipped_lines: 0,
            recovered_errors: 0,
        }
    }

    /// Feed the next line of the trace (without its line terminator)
    pub fn feed_line(&mut self, text: &str) -> Result<Option<EventRecord>> {
        let line = self.lines_read;
        self.lines_read += 1;

        let result = self.dispatch(line, text);
        if let Err(err) = &result {
            if err.is_recoverable() {
                self.recover(err);
            }
        }
        result
    }

    /// Close the trace. Fails if the input stopped inside an event triple.
    pub fn finish(&mut self) -> Result<()> {
        if self.resyncing {
            self.ended_while_resyncing = true;
            log::warn!(
                "Trace ended while looking for a history header ({} lines skipped)",
                self.skipped_lines
            );
            return Ok(());
        }

        match self.schedule.end_of_input(self.lines_read) {
            EndOfInput::Clean => {
                if self.sequencer.counters().total_events == 0 {
                    log::warn!("Trace contains no events");
                }
                Ok(())
            }
            EndOfInput::InPreamble => {
                log::warn!("Trace ended after {} lines, inside the preamble", self.lines_read);
                Ok(())
            }
            EndOfInput::OpenHistory => {
                log::warn!(
                    "Trace ended inside a history after {} events",
                    self.sequencer.counters().events_in_current_history
                );
                Ok(())
            }
            EndOfInput::Truncated(expected) => {
                self.sequencer.discard_in_flight();
                Err(DecoderError::TruncatedStream {
                    line: self.lines_read,
                    expected,
                })
            }
        }
    }

    pub fn stats(&self) -> DecodeStats {
        let counters = self.sequencer.counters();
        DecodeStats {
            lines_read: self.lines_read,
            total_events: counters.total_events,
            total_completed_histories: counters.total_completed_histories,
            discarded_events: self.discarded_events,
            skipped_lines: self.skipped_lines,
            recovered_errors: self.recovered_errors,
            ended_while_resyncing: self.ended_while_resyncing,
        }
    }

    pub fn counters(&self) -> SequencerCounters {
        self.sequencer.counters()
    }

    pub fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    pub fn is_resyncing(&self) -> bool {
        self.resyncing
    }

    fn dispatch(&mut self, line: u64, text: &str) -> Result<Option<EventRecord>> {
        if self.resyncing {
            if !looks_like_history_header(text) {
                log::trace!("Line {}: skipped while resynchronizing", line);
                self.skipped_lines += 1;
                return Ok(None);
            }
            log::info!("Resynchronized on history header at line {}", line);
            self.resyncing = false;
            self.schedule.resync_at(line);
        }

        let Some(role) = self.schedule.role_of(line) else {
            log::trace!("Line {}: nothing scheduled, ignoring", line);
            return Ok(None);
        };
        self.current_role = Some(role);
        log::trace!("Line {}: {}", line, role);

        match role {
            ScanState::PreludeLines => {
                self.preamble.title.push(text.trim_end().to_string());
                Ok(None)
            }
            ScanState::FilterInfoLines => {
                self.preamble.filter_lines.push(text.trim_end().to_string());
                Ok(None)
            }
            // Declarations are informational; never fail on them.
            ScanState::VarCountLine => {
                self.preamble.variable_counts = lenient_ints(text);
                Ok(None)
            }
            ScanState::VarIdLines => {
                self.preamble.variable_ids.extend(lenient_ints(text));
                Ok(None)
            }
            ScanState::HistoryHeaderLine => {
                if text.trim().is_empty() {
                    self.schedule.defer_history_header(line);
                    return Ok(None);
                }
                let values = self.ints(line, text)?;
                self.sequencer.on_history_header(line, &values)?;
                self.schedule.on_history_header(line);
                Ok(None)
            }
            ScanState::EventInfoLine => {
                let values = self.ints(line, text)?;
                let ends_history = self.sequencer.on_event_info(line, &values)?;
                self.schedule.on_event_info(line, ends_history);
                Ok(None)
            }
            ScanState::EventDetailLine => {
                let values = tokenizer::parse_floats(text, self.token_mode)
                    .map_err(|source| DecoderError::Token { line, source })?;
                let record = self.sequencer.on_event_detail(line, &values)?;
                Ok(Some(record))
            }
        }
    }

    fn ints(&self, line: u64, text: &str) -> Result<Vec<i64>> {
        tokenizer::parse_ints(text, self.token_mode)
            .map_err(|source| DecoderError::Token { line, source })
    }

    fn recover(&mut self, err: &DecoderError) {
        let had_event = self.sequencer.discard_in_flight();
        if had_event || self.current_role == Some(ScanState::EventInfoLine) {
            self.discarded_events += 1;
        }
        self.recovered_errors += 1;
        self.resyncing = true;
        log::warn!("{}; skipping to the next history header", err);
    }
}

fn looks_like_history_header(text: &str) -> bool {
    match tokenizer::parse_ints(text, TokenMode::Strict) {
        Ok(values) => {
            (HEADER_FIELDS..INFO_FIELDS).contains(&values.len())
                && EventKind::from_code(values[1]).is_some()
        }
        Err(_) => false,
    }
}

fn lenient_ints(text: &str) -> Vec<i64> {
    tokenizer::parse_ints(text, TokenMode::Lenient).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;

    fn config() -> DecoderConfig {
        DecoderConfig::new()
            .with_prelude_lines(1)
            .with_filter_lines(1)
            .with_var_id_lines(1)
    }

    const PREAMBLE: [&str; 4] = ["mcnp6 ptrac", "1 2 3", "7 8 9 9 9", "1 2 3 4 5 6 7"];

    fn feed_all(scanner: &mut TraceScanner, lines: &[&str]) -> Vec<Result<Option<EventRecord>>> {
        lines.iter().map(|line| scanner.feed_line(line)).collect()
    }

    #[test]
    fn test_preamble_capture() {
        let mut scanner = TraceScanner::new(&config());
        for result in feed_all(&mut scanner, &PREAMBLE) {
            assert!(matches!(result, Ok(None)));
        }
        let preamble = scanner.preamble();
        assert_eq!(preamble.title, vec!["mcnp6 ptrac".to_string()]);
        assert_eq!(preamble.filter_lines, vec!["1 2 3".to_string()]);
        assert_eq!(preamble.variable_counts, vec![7, 8, 9, 9, 9]);
        assert_eq!(preamble.variable_ids, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(scanner.finish().is_ok());
    }

    #[test]
    fn test_emits_on_detail_line() {
        let mut scanner = TraceScanner::new(&config());
        feed_all(&mut scanner, &PREAMBLE);

        assert!(matches!(scanner.feed_line("1 1000"), Ok(None)));
        assert!(matches!(scanner.feed_line("9000 0 1 5 5 2 0"), Ok(None)));
        let record = scanner
            .feed_line("1.0 2.0 3.0 0.1 0.2 0.97 14.1 1.0 0.0")
            .unwrap()
            .unwrap();
        assert_eq!(record.kind, EventKind::Source);
        assert_eq!(scanner.stats().total_events, 1);
        assert_eq!(scanner.stats().lines_read, 7);
        assert!(scanner.finish().is_ok());
    }

    #[test]
    fn test_resync_after_short_detail() {
        let mut scanner = TraceScanner::new(&config());
        feed_all(&mut scanner, &PREAMBLE);

        scanner.feed_line("1 1000").unwrap();
        scanner.feed_line("4000 0 1 5 5 2 0").unwrap();
        let err = scanner.feed_line("1.0 2.0 3.0 0.1 0.2 0.97").unwrap_err();
        assert!(matches!(err, DecoderError::MissingField { found: 6, .. }));
        assert!(scanner.is_resyncing());

        // Rest of history 1 is skipped
        assert!(matches!(scanner.feed_line("9000 1 92235 18 5 2 1"), Ok(None)));
        assert!(matches!(scanner.feed_line("1 2 3 0 0 1 2.0 1.0 0.5"), Ok(None)));

        scanner.feed_line("2 1000").unwrap();
        assert!(!scanner.is_resyncing());
        scanner.feed_line("9000 0 1 5 5 2 0").unwrap();
        let record = scanner
            .feed_line("0 0 0 0 0 1 1.0 1.0 0.0")
            .unwrap()
            .unwrap();
        assert_eq!(record.history_id, 2);

        let stats = scanner.stats();
        assert_eq!(stats.total_events, 1);
        assert_eq!(stats.total_completed_histories, 1);
        assert_eq!(stats.discarded_events, 1);
        assert_eq!(stats.skipped_lines, 2);
        assert_eq!(stats.recovered_errors, 1);
        assert!(scanner.finish().is_ok());
    }

    #[test]
    fn test_header_shape() {
        assert!(looks_like_history_header("   17    1000"));
        assert!(looks_like_history_header("17 2012 4 0"));
        assert!(looks_like_history_header("17 -2012 4"));
        assert!(!looks_like_history_header("17"));
        assert!(!looks_like_history_header("17 1234"));
        assert!(!looks_like_history_header("9000 1 92235 18 5 2 1"));
        assert!(!looks_like_history_header("1.0 2.0"));
        assert!(!looks_like_history_header(""));
    }

    #[test]
    fn test_resync_on_wide_headers() {
        let mut scanner = TraceScanner::new(&config());
        feed_all(&mut scanner, &PREAMBLE);

        scanner.feed_line("1 1000 5").unwrap();
        scanner.feed_line("4000 0 1 5 5 2 0").unwrap();
        assert!(scanner.feed_line("0.0 0.0 0.0").is_err());
        scanner.feed_line("9000 1 92235 18 5 2 1").unwrap();
        scanner.feed_line("1 2 3 0 0 1 2.0 1.0 0.5").unwrap();

        let mut ids = Vec::new();
        for line in [
            "2 1000 5",
            "9000 0 1 5 5 2 0",
            "0 0 0 0 0 1 1.0 1.0 0.0",
            "3 1000 5",
            "9000 0 1 5 5 2 0",
            "0 0 0 0 0 1 1.0 1.0 0.0",
        ] {
            if let Some(record) = scanner.feed_line(line).unwrap() {
                ids.push(record.history_id);
            }
        }
        assert_eq!(ids, vec![2, 3]);
        assert!(scanner.finish().is_ok());

        let stats = scanner.stats();
        assert_eq!(stats.skipped_lines, 2);
        assert!(!stats.ended_while_resyncing);
    }

    #[test]
    fn test_end_while_resyncing_is_recorded() {
        let mut scanner = TraceScanner::new(&config());
        feed_all(&mut scanner, &PREAMBLE);
        scanner.feed_line("1 1000").unwrap();
        scanner.feed_line("4000 0 1 5 5 2 0").unwrap();
        assert!(scanner.feed_line("0.0").is_err());
        scanner.feed_line("9000 1 92235 18 5 2 1").unwrap();

        assert!(scanner.finish().is_ok());
        assert!(scanner.stats().ended_while_resyncing);
    }

    #[test]
    fn test_truncated_after_header() {
        let mut scanner = TraceScanner::new(&config());
        feed_all(&mut scanner, &PREAMBLE);
        scanner.feed_line("1 1000").unwrap();

        let err = scanner.finish().unwrap_err();
        assert!(matches!(
            err,
            DecoderError::TruncatedStream {
                line: 5,
                expected: ScanState::EventInfoLine
            }
        ));
    }

    #[test]
    fn test_blank_trailing_lines() {
        let mut scanner = TraceScanner::new(&config());
        feed_all(&mut scanner, &PREAMBLE);
        scanner.feed_line("1 4000").unwrap();
        scanner.feed_line("9000 0 92235 2 5 2 1").unwrap();
        scanner.feed_line("1 2 3 0 0 1 2.0 1.0 0.5").unwrap();
        assert!(matches!(scanner.feed_line(""), Ok(None)));
        assert!(matches!(scanner.feed_line("   "), Ok(None)));
        assert!(scanner.finish().is_ok());
        assert_eq!(scanner.stats().total_events, 1);
    }

    #[test]
    fn test_strict_token_error_recovers() {
        let mut scanner = TraceScanner::new(&config().strict());
        feed_all(&mut scanner, &PREAMBLE);
        scanner.feed_line("1 1000").unwrap();
        let err = scanner.feed_line("9000 0 1 5 five 2 0").unwrap_err();
        assert!(matches!(err, DecoderError::Token { line: 5, .. }));
        assert_eq!(scanner.stats().discarded_events, 1);
        assert!(scanner.is_resyncing());
    }
}
