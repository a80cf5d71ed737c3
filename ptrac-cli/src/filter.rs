//! Event cuts
//!
//! Post-decode selection of records by kind, cell, material, history number
//! and energy.

use crate::config::CutsConfig;
use anyhow::{anyhow, Result};
use ptrac_decoder::{EventKind, EventRecord};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Compiled form of [`CutsConfig`]
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    kinds: BTreeSet<EventKind>,
    cells: BTreeSet<i64>,
    materials: BTreeSet<i64>,
    histories: Option<RangeInclusive<i64>>,
    min_energy: Option<f64>,
}

impl EventFilter {
    pub fn from_cuts(cuts: &CutsConfig) -> Result<Self> {
        let kinds = cuts
            .kinds
            .iter()
            .map(|name| name.parse::<EventKind>().map_err(|e| anyhow!(e)))
            .collect::<Result<BTreeSet<_>>>()?;

        let histories = match (cuts.min_history, cuts.max_history) {
            (None, None) => None,
            (min, max) => Some(min.unwrap_or(i64::MIN)..=max.unwrap_or(i64::MAX)),
        };

        Ok(Self {
            kinds,
            cells: cuts.cells.iter().copied().collect(),
            materials: cuts.materials.iter().copied().collect(),
            histories,
            min_energy: cuts.min_energy,
        })
    }

    /// Add kinds on top of the configured ones
    pub fn with_kinds(mut self, kinds: &[EventKind]) -> Self {
        self.kinds.extend(kinds.iter().copied());
        self
    }

    pub fn is_pass_through(&self) -> bool {
        self.kinds.is_empty()
            && self.cells.is_empty()
            && self.materials.is_empty()
            && self.histories.is_none()
            && self.min_energy.is_none()
    }

    pub fn accepts(&self, record: &EventRecord) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&record.kind) {
            return false;
        }
        // Surface events carry no cell and never pass a cell cut
        if !self.cells.is_empty() && !record.cell().is_some_and(|c| self.cells.contains(&c)) {
            return false;
        }
        if !self.materials.is_empty() && !self.materials.contains(&record.material()) {
            return false;
        }
        if let Some(range) = &self.histories {
            if !range.contains(&record.history_id) {
                return false;
            }
        }
        match self.min_energy {
            Some(min) => record.energy >= min,
            None => true,
        }
    }
}
