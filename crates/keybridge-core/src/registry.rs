//! Keysyms currently considered held

use std::collections::BTreeSet;

use crate::keysym::Keysym;

/// Set of keysyms for which a press has been emitted without a matching
/// release. Absent means not held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PressedRegistry {
    held: BTreeSet<Keysym>,
}

impl PressedRegistry {
    pub fn is_pressed(&self, keysym: Keysym) -> bool {
        self.held.contains(&keysym)
    }

    /// Held keysyms in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Keysym> + '_ {
        self.held.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub(crate) fn mark_pressed(&mut self, keysym: Keysym) {
        self.held.insert(keysym);
    }

    pub(crate) fn mark_released(&mut self, keysym: Keysym) {
        self.held.remove(&keysym);
    }
}
