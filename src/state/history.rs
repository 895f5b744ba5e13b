//! Bounded undo history.

use crate::types::GraphState;
use std::collections::VecDeque;

/// LIFO stack of whole-graph snapshots with a capacity bound.
///
/// Snapshots are owned deep copies, so nothing done to the live state can
/// reach into history. When the bound is exceeded the *oldest* snapshot is
/// dropped; this is capacity control, not usage-order eviction.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    snapshots: VecDeque<GraphState>,
    capacity: usize,
}

impl HistoryStack {
    /// Empty stack holding at most `capacity` snapshots.
    pub fn new(capacity: usize) -> Self {
        HistoryStack {
            snapshots: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Record a copy of `state` as the newest snapshot.
    pub fn push(&mut self, state: &GraphState) {
        self.snapshots.push_back(state.clone());
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
    }

    /// Remove and return the newest snapshot.
    pub fn pop(&mut self) -> Option<GraphState> {
        self.snapshots.pop_back()
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// True when there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Maximum number of snapshots held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
