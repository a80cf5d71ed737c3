//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct opens trace sources and hands out lazy event iterators,
//! or pumps decoded records straight into an [`EventSink`].

use crate::config::DecoderConfig;
use crate::scanner::{DecodeStats, Preamble, TraceScanner};
use crate::sink::EventSink;
use crate::types::{DecoderError, EventRecord, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::iter::FusedIterator;
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder with the given configuration
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Open a trace file and return an iterator of decoded events
    ///
    /// # Arguments
    /// * `path` - Path to the PTRAC file (ASCII format)
    ///
    /// # Returns
    /// * `Result<TraceEvents<..>>` - `SourceUnavailable` if the file cannot be opened
    ///
    /// # Example
    /// ```no_run
    /// use ptrac_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::new(DecoderConfig::new());
    /// let events = decoder.decode_file(Path::new("run.ptrac")).unwrap();
    ///
    /// for event in events {
    ///     match event {
    ///         Ok(record) => println!("{} {:?}", record.history_id, record.kind),
    ///         Err(e) => eprintln!("Error: {}", e),
    ///     }
    /// }
    /// ```
    pub fn decode_file(&self, path: &Path) -> Result<TraceEvents<BufReader<File>>> {
        log::info!("Decoding trace file: {:?}", path);

        let file = File::open(path).map_err(|source| DecoderError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(self.decode_reader(BufReader::new(file)))
    }

    /// Decode any buffered reader
    pub fn decode_reader<R: BufRead>(&self, reader: R) -> TraceEvents<R> {
        TraceEvents {
            reader,
            buffer: Vec::new(),
            scanner: TraceScanner::new(&self.config),
            done: false,
        }
    }

    /// Decode an in-memory trace
    pub fn decode_str<'a>(&self, text: &'a str) -> TraceEvents<&'a [u8]> {
        self.decode_reader(text.as_bytes())
    }

    /// Decode a trace file into a sink
    pub fn decode_file_into<S>(&self, path: &Path, sink: &mut S) -> Result<DecodeStats>
    where
        S: EventSink + ?Sized,
    {
        let events = self.decode_file(path)?;
        pump(events, sink)
    }

    /// Decode a reader into a sink.
    ///
    /// Per-record errors are skipped (the scanner has already logged them).
    /// A stream-level error is returned after the sink has received every
    /// record decoded before it and has been finished.
    pub fn decode_into<R, S>(&self, reader: R, sink: &mut S) -> Result<DecodeStats>
    where
        R: BufRead,
        S: EventSink + ?Sized,
    {
        pump(self.decode_reader(reader), sink)
    }
}

fn pump<R, S>(mut events: TraceEvents<R>, sink: &mut S) -> Result<DecodeStats>
where
    R: BufRead,
    S: EventSink + ?Sized,
{
    let mut terminal = None;
    for item in events.by_ref() {
        match item {
            Ok(record) => {
                if let Err(e) = sink.accept(record) {
                    terminal = Some(e);
                    break;
                }
            }
            Err(e) if e.is_recoverable() => continue,
            Err(e) => {
                terminal = Some(e);
                break;
            }
        }
    }

    let stats = events.stats();
    let finished = sink.finish(&stats);
    log::info!(
        "Decoded {} events in {} histories ({} lines)",
        stats.total_events,
        stats.total_completed_histories,
        stats.lines_read
    );

    match terminal {
        Some(e) => Err(e),
        None => finished.map(|()| stats),
    }
}

/// Lazy iterator over the records of one trace
///
/// Per-record errors are yielded as `Err` items and iteration continues.
/// A stream-level error (truncation, read failure) is yielded once, after
/// which the iterator is exhausted. The underlying reader is dropped with the
/// iterator.
///
/// Lines are read as bytes; invalid UTF-8 is replaced rather than failing the
/// stream, since only ASCII numeric fields are ever decoded.
pub struct TraceEvents<R> {
    reader: R,
    buffer: Vec<u8>,
    scanner: TraceScanner,
    done: bool,
}

impl<R> TraceEvents<R> {
    /// Counters so far
    pub fn stats(&self) -> DecodeStats {
        self.scanner.stats()
    }

    /// Preamble lines read so far
    pub fn preamble(&self) -> &Preamble {
        self.scanner.preamble()
    }
}

impl<R: BufRead> Iterator for TraceEvents<R> {
    type Item = Result<EventRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => {
                    self.done = true;
                    return self.scanner.finish().err().map(Err);
                }
                Ok(_) => {
                    let text = String::from_utf8_lossy(trim_line_end(&self.buffer));
                    if let Cow::Owned(_) = text {
                        log::debug!(
                            "Line {}: invalid UTF-8 replaced",
                            self.scanner.stats().lines_read
                        );
                    }
                    match self.scanner.feed_line(&text) {
                        Ok(Some(record)) => return Some(Ok(record)),
                        Ok(None) => continue,
                        Err(e) => return Some(Err(e)),
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(DecoderError::Io(e)));
                }
            }
        }
    }
}

impl<R: BufRead> FusedIterator for TraceEvents<R> {}

/// Strip a trailing `\n` or `\r\n`
fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
