//! Core types for the PTRAC decoder library
//!
//! This module defines the event record the decoder emits for every complete
//! header/info/detail triple, the event kind discriminant, and the error type
//! shared by every stage of the pipeline.

use crate::catalog::BankReason;
use crate::schedule::ScanState;
use crate::tokenizer::TokenError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Next-event code that closes the current history
pub const TERMINATION_MARKER: i64 = 9000;

/// Raw event codes as written by MCNP
pub const SOURCE_CODE: i64 = 1000;
pub const BANK_CODE: i64 = 2000;
pub const SURFACE_CODE: i64 = 3000;
pub const COLLISION_CODE: i64 = 4000;
pub const TERMINATION_CODE: i64 = 5000;

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Cannot open trace file {path:?}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Trace ends at line {line} while a {expected} was still expected")]
    TruncatedStream { line: u64, expected: ScanState },

    #[error("Line {line}: {role} needs {expected} fields, found {found}")]
    MissingField {
        line: u64,
        role: ScanState,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: {source}")]
    Token {
        line: u64,
        #[source]
        source: TokenError,
    },

    #[error("Line {line}: unknown event type code {code}")]
    UnknownEventKind { line: u64, code: i64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecoderError {
    /// True for per-record errors the scanner recovers from by resynchronizing
    /// at the next history header. Stream-level errors end the decode.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DecoderError::MissingField { .. }
                | DecoderError::Token { .. }
                | DecoderError::UnknownEventKind { .. }
        )
    }
}

/// Collapsed event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    Source,
    Bank,
    Surface,
    Collision,
    Termination,
}

impl EventKind {
    /// All kinds, in code order
    pub const ALL: [EventKind; 5] = [
        EventKind::Source,
        EventKind::Bank,
        EventKind::Surface,
        EventKind::Collision,
        EventKind::Termination,
    ];

    /// Classify a raw event code.
    ///
    /// Bank events carry a sub-reason in the low digits, so every code with
    /// `2000 <= |code| < 3000` is a bank. The other kinds match the raw code
    /// exactly, sign included.
    pub fn from_code(code: i64) -> Option<Self> {
        if (BANK_CODE..SURFACE_CODE).contains(&code.saturating_abs()) {
            return Some(EventKind::Bank);
        }
        match code {
            SOURCE_CODE => Some(EventKind::Source),
            SURFACE_CODE => Some(EventKind::Surface),
            COLLISION_CODE => Some(EventKind::Collision),
            TERMINATION_CODE => Some(EventKind::Termination),
            _ => None,
        }
    }

    /// Canonical raw code for this kind
    pub fn code(&self) -> i64 {
        match self {
            EventKind::Source => SOURCE_CODE,
            EventKind::Bank => BANK_CODE,
            EventKind::Surface => SURFACE_CODE,
            EventKind::Collision => COLLISION_CODE,
            EventKind::Termination => TERMINATION_CODE,
        }
    }

    /// Short label used in PTRAC listings
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Source => "SRC",
            EventKind::Bank => "BNK",
            EventKind::Surface => "SUR",
            EventKind::Collision => "COL",
            EventKind::Termination => "TER",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Source => write!(f, "Source"),
            EventKind::Bank => write!(f, "Bank"),
            EventKind::Surface => write!(f, "Surface"),
            EventKind::Collision => write!(f, "Collision"),
            EventKind::Termination => write!(f, "Termination"),
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" | "src" => Ok(EventKind::Source),
            "bank" | "bnk" => Ok(EventKind::Bank),
            "surface" | "sur" => Ok(EventKind::Surface),
            "collision" | "col" => Ok(EventKind::Collision),
            "termination" | "ter" => Ok(EventKind::Termination),
            other => Err(format!("unknown event kind '{}'", other)),
        }
    }
}

/// Kind-specific integer fields of an event info line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindFields {
    Source {
        source_type: i64,
        cell: i64,
        material: i64,
    },
    Bank {
        zzaaa: i64,
        reaction_type: i64,
        cell: i64,
        material: i64,
    },
    Surface {
        surface: i64,
        angle_code: i64,
        material: i64,
    },
    Collision {
        zzaaa: i64,
        reaction_type: i64,
        cell: i64,
        material: i64,
    },
    Termination {
        termination_type: i64,
        branch: i64,
        cell: i64,
        material: i64,
    },
}

impl KindFields {
    /// Decode tokens 2..=5 of an event info line for the given kind
    pub(crate) fn decode(kind: EventKind, v: &[i64]) -> Self {
        match kind {
            // Source lines repeat the cell number; the second copy wins.
            EventKind::Source => KindFields::Source {
                source_type: v[2],
                cell: v[4],
                material: v[5],
            },
            EventKind::Bank => KindFields::Bank {
                zzaaa: v[2],
                reaction_type: v[3],
                cell: v[4],
                material: v[5],
            },
            EventKind::Surface => KindFields::Surface {
                surface: v[2],
                angle_code: v[3],
                material: v[4],
            },
            EventKind::Collision => KindFields::Collision {
                zzaaa: v[2],
                reaction_type: v[3],
                cell: v[4],
                material: v[5],
            },
            EventKind::Termination => KindFields::Termination {
                termination_type: v[2],
                branch: v[3],
                cell: v[4],
                material: v[5],
            },
        }
    }

    /// The kind this field group belongs to
    pub fn kind(&self) -> EventKind {
        match self {
            KindFields::Source { .. } => EventKind::Source,
            KindFields::Bank { .. } => EventKind::Bank,
            KindFields::Surface { .. } => EventKind::Surface,
            KindFields::Collision { .. } => EventKind::Collision,
            KindFields::Termination { .. } => EventKind::Termination,
        }
    }
}

/// One decoded particle-transport event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// History (NPS) number this event belongs to
    pub history_id: i64,
    /// Collapsed event kind
    pub kind: EventKind,
    /// Raw code that produced `kind` (bank sub-reason preserved)
    pub kind_code: i64,
    /// Kind of the first event in the history
    pub initial_kind: EventKind,
    /// Raw next-event code
    pub next_kind_code: i64,
    /// Number of nodes in the track from source to this event
    pub node_count: i64,
    /// Kind-specific fields
    pub fields: KindFields,
    /// Particle type (zero when the trace layout does not carry it)
    pub particle_type: i64,
    /// Number of collisions in the history so far
    pub collision_count: i64,
    /// Event position (cm)
    pub position: [f64; 3],
    /// Exit direction cosines
    pub direction: [f64; 3],
    /// Energy after the event (MeV)
    pub energy: f64,
    /// Weight after the event
    pub weight: f64,
    /// Time of the event (shakes)
    pub time: f64,
}

impl EventRecord {
    /// True if no further events follow in this history
    pub fn ends_history(&self) -> bool {
        self.next_kind_code == TERMINATION_MARKER
    }

    /// Problem cell, if the layout for this kind carries one
    pub fn cell(&self) -> Option<i64> {
        match self.fields {
            KindFields::Source { cell, .. }
            | KindFields::Bank { cell, .. }
            | KindFields::Collision { cell, .. }
            | KindFields::Termination { cell, .. } => Some(cell),
            KindFields::Surface { .. } => None,
        }
    }

    /// Problem material
    pub fn material(&self) -> i64 {
        match self.fields {
            KindFields::Source { material, .. }
            | KindFields::Bank { material, .. }
            | KindFields::Surface { material, .. }
            | KindFields::Collision { material, .. }
            | KindFields::Termination { material, .. } => material,
        }
    }

    /// Target ZZAAA for bank and collision events
    pub fn zzaaa(&self) -> Option<i64> {
        match self.fields {
            KindFields::Bank { zzaaa, .. } | KindFields::Collision { zzaaa, .. } => Some(zzaaa),
            _ => None,
        }
    }

    /// Reaction type (MT) for bank and collision events
    pub fn reaction_type(&self) -> Option<i64> {
        match self.fields {
            KindFields::Bank { reaction_type, .. }
            | KindFields::Collision { reaction_type, .. } => Some(reaction_type),
            _ => None,
        }
    }

    /// Bank sub-reason, for bank events with a documented sub-code
    pub fn bank_reason(&self) -> Option<BankReason> {
        match self.kind {
            EventKind::Bank => BankReason::from_code(self.kind_code),
            _ => None,
        }
    }
}
