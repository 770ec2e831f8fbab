use crate::{TrackerError, TrackerResult, WindowIdentity, WindowSnapshot};
use std::collections::VecDeque;

/// Bounded, deduplicated, most-recent-first list of observed windows.
///
/// This type is not synchronised; the tracker wraps it in a single mutex.
#[derive(Debug, Clone)]
pub struct RecencyHistory {
    entries: VecDeque<WindowSnapshot>,
    capacity: usize,
}

impl RecencyHistory {
    /// A zero capacity is raised to one so `observe` always retains the latest window.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    #[must_use]
    pub fn contains(&self, identity: &WindowIdentity) -> bool {
        self.entries.iter().any(|entry| &entry.identity == identity)
    }

    /// Moves `snapshot` to the front, dropping any older entry with the same
    /// identity and evicting the oldest entries beyond capacity.
    pub fn observe(&mut self, snapshot: WindowSnapshot) {
        self.remove(&snapshot.identity);
        self.entries.push_front(snapshot);
        self.entries.truncate(self.capacity);
    }

    /// Appends at the oldest end without reordering existing entries.
    ///
    /// Returns `false` when the identity is already present or the history is full.
    pub fn seed(&mut self, snapshot: WindowSnapshot) -> bool {
        if self.is_full() || self.contains(&snapshot.identity) {
            return false;
        }
        self.entries.push_back(snapshot);
        true
    }

    pub fn remove(&mut self, identity: &WindowIdentity) -> Option<WindowSnapshot> {
        let position = self
            .entries
            .iter()
            .position(|entry| &entry.identity == identity)?;
        self.entries.remove(position)
    }

    /// `0` is the most recently observed window.
    pub fn index_of(&self, index: usize) -> TrackerResult<&WindowSnapshot> {
        self.entries.get(index).ok_or(TrackerError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    #[must_use]
    pub fn front(&self) -> Option<&WindowSnapshot> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowSnapshot> {
        self.entries.iter()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<WindowSnapshot> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for RecencyHistory {
    fn default() -> Self {
        Self::with_capacity(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}
