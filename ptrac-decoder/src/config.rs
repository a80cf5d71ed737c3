//! Decoder configuration types
//!
//! The only value upstream header parsing has to supply is the prelude length.
//! The rest of the preamble layout defaults to the standard PTRAC ASCII layout.

use crate::schedule::PreambleLayout;
use crate::tokenizer::TokenMode;
use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Number of title/header lines before the filter-info block
    #[serde(default = "default_prelude_lines")]
    pub prelude_line_count: usize,

    /// Number of filter-info lines
    #[serde(default = "default_filter_lines")]
    pub filter_line_count: usize,

    /// Number of variable-id declaration lines
    #[serde(default = "default_var_id_lines")]
    pub var_id_line_count: usize,

    /// Conversion policy for malformed numeric tokens
    #[serde(default)]
    pub token_mode: TokenMode,
}

fn default_prelude_lines() -> usize {
    4
}

fn default_filter_lines() -> usize {
    3
}

fn default_var_id_lines() -> usize {
    3
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            prelude_line_count: default_prelude_lines(),
            filter_line_count: default_filter_lines(),
            var_id_line_count: default_var_id_lines(),
            token_mode: TokenMode::default(),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the prelude length
    pub fn with_prelude_lines(mut self, count: usize) -> Self {
        self.prelude_line_count = count;
        self
    }

    /// Builder method: set the filter-info block length
    pub fn with_filter_lines(mut self, count: usize) -> Self {
        self.filter_line_count = count;
        self
    }

    /// Builder method: set the number of variable-id lines
    pub fn with_var_id_lines(mut self, count: usize) -> Self {
        self.var_id_line_count = count;
        self
    }

    /// Builder method: set the token conversion mode
    pub fn with_token_mode(mut self, mode: TokenMode) -> Self {
        self.token_mode = mode;
        self
    }

    /// Builder method: shorthand for strict token conversion
    pub fn strict(self) -> Self {
        self.with_token_mode(TokenMode::Strict)
    }

    /// Preamble layout derived from this configuration
    pub fn layout(&self) -> PreambleLayout {
        PreambleLayout {
            prelude_lines: self.prelude_line_count as u64,
            filter_lines: self.filter_line_count as u64,
            var_id_lines: self.var_id_line_count as u64,
        }
    }
}
