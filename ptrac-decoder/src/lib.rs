//! PTRAC Decoder Library
//!
//! A streaming decoder for MCNP particle-track (PTRAC) files in ASCII format.
//! It turns the line-oriented trace into an ordered sequence of typed
//! [`EventRecord`]s, one per decoded event.
//!
//! # Architecture
//!
//! - `tokenizer` splits lines into numeric fields (lenient or strict)
//! - `schedule` knows which role each line plays from its position
//! - `sequencer` owns the counters and the record being assembled
//! - `scanner` drives the three per line and recovers from bad records
//! - `decoder` opens sources and exposes iterators and sink pumps
//!
//! The library does NOT:
//! - Bin, histogram or fit anything
//! - Persist records in any storage format
//! - Parse the PTRAC keyword header (the caller supplies the prelude length)
//!
//! # Example Usage
//!
//! ```no_run
//! use ptrac_decoder::{CountingSink, Decoder, DecoderConfig, EventKind};
//! use std::path::Path;
//!
//! let decoder = Decoder::new(DecoderConfig::new().with_prelude_lines(4));
//!
//! // Lazy iteration
//! for event in decoder.decode_file(Path::new("run.ptrac")).unwrap() {
//!     match event {
//!         Ok(record) => println!("history {} {}", record.history_id, record.kind),
//!         Err(e) => eprintln!("Decode error: {}", e),
//!     }
//! }
//!
//! // Or push everything into a sink
//! let mut counts = CountingSink::new();
//! let stats = decoder.decode_file_into(Path::new("run.ptrac"), &mut counts).unwrap();
//! println!("{} histories, {} collisions",
//!     stats.total_completed_histories,
//!     counts.count(EventKind::Collision));
//! ```

// Public modules
pub mod catalog;
pub mod config;
pub mod decoder;
pub mod scanner;
pub mod schedule;
pub mod sequencer;
pub mod sink;
pub mod tokenizer;
pub mod types;

// Re-export main types for convenience
pub use catalog::{BankReason, ParticleFamily};
pub use config::DecoderConfig;
pub use decoder::{Decoder, TraceEvents};
pub use scanner::{DecodeStats, Preamble, TraceScanner};
pub use schedule::ScanState;
pub use sink::{CountingSink, EventSink, FnSink};
pub use tokenizer::{TokenError, TokenMode};
pub use types::{
    DecoderError, EventKind, EventRecord, KindFields, Result, TERMINATION_MARKER,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: a fresh scanner starts from zero
        let scanner = TraceScanner::new(&DecoderConfig::default());
        assert_eq!(scanner.stats(), DecodeStats::default());
        assert!(!VERSION.is_empty());
    }
}
