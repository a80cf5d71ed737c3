//! Line-offset schedule
//!
//! PTRAC records have no length prefix: the role of every line follows from
//! its absolute position and from the next-event codes decoded so far. This
//! module holds that bookkeeping as a small state machine with no I/O, so the
//! offsets can be tested on their own.
//!
//! ```text
//! [0, p)            prelude (title) lines
//! [p, p+f)          filter-info lines
//! p+f               variable-count line
//! (p+f, p+f+1+n)    variable-id lines
//! then, per history:
//!   header, info, detail, [info, detail]*   (last info carries 9000)
//! ```

use std::fmt;

/// Role of a line within the trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    PreludeLines,
    FilterInfoLines,
    VarCountLine,
    VarIdLines,
    HistoryHeaderLine,
    EventInfoLine,
    EventDetailLine,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanState::PreludeLines => write!(f, "prelude line"),
            ScanState::FilterInfoLines => write!(f, "filter-info line"),
            ScanState::VarCountLine => write!(f, "variable-count line"),
            ScanState::VarIdLines => write!(f, "variable-id line"),
            ScanState::HistoryHeaderLine => write!(f, "history header line"),
            ScanState::EventInfoLine => write!(f, "event info line"),
            ScanState::EventDetailLine => write!(f, "event detail line"),
        }
    }
}

/// Line counts of the blocks before the first history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreambleLayout {
    pub prelude_lines: u64,
    pub filter_lines: u64,
    pub var_id_lines: u64,
}

impl PreambleLayout {
    /// Total preamble length; the first history header sits on this line
    pub fn len(&self) -> u64 {
        self.prelude_lines + self.filter_lines + 1 + self.var_id_lines
    }

    /// Role of a preamble line, or `None` once the preamble is over
    pub fn role_of(&self, line: u64) -> Option<ScanState> {
        let filter_start = self.prelude_lines;
        let count_line = filter_start + self.filter_lines;

        if line < filter_start {
            Some(ScanState::PreludeLines)
        } else if line < count_line {
            Some(ScanState::FilterInfoLines)
        } else if line == count_line {
            Some(ScanState::VarCountLine)
        } else if line < self.len() {
            Some(ScanState::VarIdLines)
        } else {
            None
        }
    }
}

/// Absolute line counters for the repeating history/event cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSchedule {
    layout: PreambleLayout,
    next_history_line: Option<u64>,
    next_event_info_line: Option<u64>,
    next_event_detail_line: Option<u64>,
}

impl LineSchedule {
    /// Schedule with the first history header right after the preamble
    pub fn new(layout: PreambleLayout) -> Self {
        Self {
            layout,
            next_history_line: Some(layout.len()),
            next_event_info_line: None,
            next_event_detail_line: None,
        }
    }

    pub fn next_history_line(&self) -> Option<u64> {
        self.next_history_line
    }

    pub fn next_event_info_line(&self) -> Option<u64> {
        self.next_event_info_line
    }

    pub fn next_event_detail_line(&self) -> Option<u64> {
        self.next_event_detail_line
    }

    /// Role of `line`, or `None` if nothing is scheduled there
    pub fn role_of(&self, line: u64) -> Option<ScanState> {
        if let Some(role) = self.layout.role_of(line) {
            return Some(role);
        }
        if self.next_history_line == Some(line) {
            Some(ScanState::HistoryHeaderLine)
        } else if self.next_event_info_line == Some(line) {
            Some(ScanState::EventInfoLine)
        } else if self.next_event_detail_line == Some(line) {
            Some(ScanState::EventDetailLine)
        } else {
            None
        }
    }

    /// A history header was read on `line`
    pub fn on_history_header(&mut self, line: u64) {
        self.next_history_line = None;
        self.next_event_info_line = Some(line + 1);
        self.next_event_detail_line = Some(line + 2);
    }

    /// An event info line was read on `line`
    pub fn on_event_info(&mut self, line: u64, ends_history: bool) {
        self.next_event_detail_line = Some(line + 1);
        if ends_history {
            self.next_history_line = Some(line + 2);
            self.next_event_info_line = Some(line + 3);
        } else {
            self.next_history_line = None;
            self.next_event_info_line = Some(line + 2);
        }
    }

    /// A blank line sat where a history header was expected
    pub fn defer_history_header(&mut self, line: u64) {
        if self.next_history_line == Some(line) {
            self.next_history_line = Some(line + 1);
        }
    }

    /// Re-anchor the cycle on a history header found at `line`
    pub fn resync_at(&mut self, line: u64) {
        self.next_history_line = Some(line);
        self.next_event_info_line = None;
        self.next_event_detail_line = None;
    }

    /// Classify the end of input after `lines_read` lines
    pub fn end_of_input(&self, lines_read: u64) -> EndOfInput {
        if lines_read < self.layout.len() {
            return EndOfInput::InPreamble;
        }
        if self.next_event_detail_line == Some(lines_read) {
            return EndOfInput::Truncated(ScanState::EventDetailLine);
        }
        if self.next_history_line.is_none() && self.next_event_info_line == Some(lines_read) {
            // Right after a header the detail line trails the info line by one.
            if self.next_event_detail_line == Some(lines_read + 1) {
                return EndOfInput::Truncated(ScanState::EventInfoLine);
            }
            return EndOfInput::OpenHistory;
        }
        EndOfInput::Clean
    }
}

/// How a trace ended relative to the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfInput {
    /// Ended on a history boundary
    Clean,
    /// Ended before the first history header
    InPreamble,
    /// Ended between two complete events of the same history
    OpenHistory,
    /// Ended inside an event triple; the role is the line still owed
    Truncated(ScanState),
}
