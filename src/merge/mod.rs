//! Merging remote snapshots and the conflict-resolution contract.
//!
//! When a remote [`GraphState`](crate::GraphState) arrives, the engine compares
//! version vectors and never inspects content unless the two copies turn out
//! to be concurrent.
//!
//! | Comparison | Outcome |
//! |------------|---------|
//! | local is descendant | [`MergeOutcome::LocalAhead`], nothing changes |
//! | equal | [`MergeOutcome::UpToDate`], nothing changes |
//! | local is ancestor | [`MergeOutcome::FastForward`], remote replaces local |
//! | conflict | [`MergeOutcome::Conflict`] with a [`ConflictSet`] |
//!
//! On conflict the engine does not pick a winner. It adopts the merged vector
//! (so the same remote copy is not reported twice) and hands back the entities
//! that differ. A resolver answers with a [`Resolution`], which the manager
//! re-applies through its ordinary mutators.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DiffItem`] | Local and remote copies of one conflicting entity |
//! | [`ConflictSet`] | Every conflicting node and edge plus the merged vector |
//! | [`Choice`] | Per-entity decision: local, remote, or a merged value |
//! | [`Resolution`] | Entities to re-apply as new local mutations |
//!
//! # Examples
//!
//! ```
//! use flowstate::merge::Choice;
//! use flowstate::{ClientId, NodeUpdate, StateManager};
//! use flowstate::storage::MemoryStore;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let mut laptop = StateManager::new(ClientId::new("laptop"), store.clone());
//! laptop.load_state().await.unwrap();
//!
//! // The phone starts from a copy of the laptop's graph.
//! let phone_store = MemoryStore::new();
//! phone_store.insert("flow-state", laptop.get_state().clone());
//! let mut phone = StateManager::new(ClientId::new("phone"), phone_store);
//! phone.load_state().await.unwrap();
//!
//! laptop.update_node("root", NodeUpdate::new().position(10.0, 0.0)).unwrap();
//! phone.update_node("root", NodeUpdate::new().position(0.0, 10.0)).unwrap();
//!
//! let outcome = laptop.merge_state(phone.get_state().clone()).await.unwrap();
//! let conflicts = outcome.conflict().unwrap();
//! assert_eq!(conflicts.conflicting_nodes.len(), 1);
//!
//! let resolution = conflicts.resolve(|_| Choice::Remote, |_| Choice::Local);
//! laptop.apply_resolution(resolution).unwrap();
//! assert_eq!(laptop.get_state().node("root").unwrap().position.y, 10.0);
//! # });
//! ```

mod conflict;
mod resolution;

pub use conflict::{ConflictSet, DiffItem};
pub use resolution::{Choice, Resolution};

use crate::version::Causality;

/// Result of [`StateManager::merge_state`](crate::StateManager::merge_state).
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Vectors are equal; nothing to do
    UpToDate,
    /// Local already contains the remote history; nothing to do
    LocalAhead,
    /// Remote strictly contained local and replaced it
    FastForward,
    /// Concurrent histories; the set lists what needs a decision
    Conflict(ConflictSet),
}

impl MergeOutcome {
    /// True unless the merge stopped on a conflict.
    pub fn is_success(&self) -> bool {
        !matches!(self, MergeOutcome::Conflict(_))
    }

    /// The conflict set, when there is one.
    pub fn conflict(&self) -> Option<&ConflictSet> {
        match self {
            MergeOutcome::Conflict(set) => Some(set),
            _ => None,
        }
    }

    /// The vector comparison that produced this outcome, read local-to-remote.
    pub fn causality(&self) -> Causality {
        match self {
            MergeOutcome::UpToDate => Causality::Equal,
            MergeOutcome::LocalAhead => Causality::Descendant,
            MergeOutcome::FastForward => Causality::Ancestor,
            MergeOutcome::Conflict(_) => Causality::Conflict,
        }
    }
}
