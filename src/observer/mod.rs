#[cfg(feature = "serde")]
use serde::Serialize;

use crate::network::{closest_match, AssociativeMemory, Diagnostics, Recall, UpdateRule};
use crate::pattern::{Cell, Pattern};

/// A read-only snapshot of a trained memory.
///
/// Observers cannot mutate the memory; snapshots are built on demand.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MemorySnapshot {
    pub rule: UpdateRule,
    pub max_cycles: usize,
    pub seed: Option<u64>,
    pub diagnostics: Diagnostics,
}

/// What a single recall did, relative to the patterns the memory was trained on.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RecallReport {
    pub probe: Vec<Vec<Cell>>,
    pub result: Vec<Vec<Cell>>,
    pub cycles: usize,
    pub converged: bool,
    pub energies: Vec<f64>,
    /// Index of the closest stored pattern, if any.
    pub matched_index: Option<usize>,
    /// Overlap with that pattern; negative means the inverted pattern was recalled.
    pub matched_overlap: Option<f64>,
}

pub struct MemoryAdapter<'a> {
    memory: &'a AssociativeMemory,
}

impl<'a> MemoryAdapter<'a> {
    pub fn new(memory: &'a AssociativeMemory) -> Self {
        Self { memory }
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        let cfg = self.memory.config();
        MemorySnapshot {
            rule: cfg.rule,
            max_cycles: cfg.max_cycles,
            seed: cfg.seed,
            diagnostics: self.memory.diagnostics(),
        }
    }

    pub fn report(&self, probe: &Pattern, recall: &Recall, stored: &[Pattern]) -> RecallReport {
        let matched = closest_match(&recall.pattern, stored);
        RecallReport {
            probe: probe.to_rows(),
            result: recall.pattern.to_rows(),
            cycles: recall.cycles,
            converged: recall.converged,
            energies: recall.energies.clone(),
            matched_index: matched.map(|m| m.index),
            matched_overlap: matched.map(|m| m.overlap),
        }
    }
}
