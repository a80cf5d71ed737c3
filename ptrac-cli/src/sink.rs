//! Output sinks for the CLI

use crate::filter::EventFilter;
use ptrac_decoder::{CountingSink, DecodeStats, EventRecord, EventSink};
use std::io::{self, Write};

/// Writes each record as one JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn accept(&mut self, record: EventRecord) -> ptrac_decoder::Result<()> {
        serde_json::to_writer(&mut self.writer, &record).map_err(io::Error::from)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self, _stats: &DecodeStats) -> ptrac_decoder::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Applies event cuts and tallies what passes, optionally writing the kept
/// records as JSON lines.
pub struct CutSink<'a, W: Write> {
    filter: &'a EventFilter,
    pub kept: CountingSink,
    pub rejected: u64,
    lines: Option<JsonLinesSink<W>>,
}

impl<'a, W: Write> CutSink<'a, W> {
    pub fn new(filter: &'a EventFilter, lines: Option<W>) -> Self {
        Self {
            filter,
            kept: CountingSink::new(),
            rejected: 0,
            lines: lines.map(JsonLinesSink::new),
        }
    }
}

impl<W: Write> EventSink for CutSink<'_, W> {
    fn accept(&mut self, record: EventRecord) -> ptrac_decoder::Result<()> {
        if !self.filter.accepts(&record) {
            self.rejected += 1;
            return Ok(());
        }
        if let Some(lines) = self.lines.as_mut() {
            lines.accept(record.clone())?;
        }
        self.kept.accept(record)
    }

    fn finish(&mut self, stats: &DecodeStats) -> ptrac_decoder::Result<()> {
        match self.lines.as_mut() {
            Some(lines) => lines.finish(stats),
            None => Ok(()),
        }
    }
}
