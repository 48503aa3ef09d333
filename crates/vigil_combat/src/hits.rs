//! Per-swing hit bookkeeping

use std::collections::HashSet;

/// Targets already damaged by the current swing
#[derive(Debug, Clone, Default)]
pub struct HitRegistry {
    hit: HashSet<u64>,
}

impl HitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hit. `false` if the target was already hit this swing.
    pub fn register(&mut self, target: u64) -> bool {
        self.hit.insert(target)
    }

    pub fn contains(&self, target: u64) -> bool {
        self.hit.contains(&target)
    }

    /// Open a fresh swing
    pub fn clear(&mut self) {
        self.hit.clear();
    }

    pub fn len(&self) -> usize {
        self.hit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hit.is_empty()
    }
}
