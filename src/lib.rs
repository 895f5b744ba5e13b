#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Flowstate: versioned graph state for offline-first clients
//!
//! This crate is the state engine behind an offline-first mind-map editor. It
//! keeps a node/edge graph in memory, records an undo snapshot before every
//! change, persists asynchronously to a local store, and reconciles copies of
//! the graph that were edited independently, without a server imposing order.
//!
//! ## Overview
//!
//! 1. **Versioning** - every graph copy carries a [`VersionVector`]
//! 2. **Mutations** - [`StateManager`] validates, snapshots, applies, bumps, saves
//! 3. **Undo** - bounded stack of whole-graph snapshots
//! 4. **Merge** - ordered histories fast-forward; concurrent ones surface a
//!    [`ConflictSet`](merge::ConflictSet) for a resolver
//!
//! ## Key Features
//!
//! - **Causal comparison without content inspection**: `Equal`, `Ancestor`,
//!   `Descendant` or `Conflict` from the vectors alone
//! - **Fire-and-forget persistence**: callers see new state immediately; a
//!   background writer catches the store up, retrying transient failures
//! - **No silent winners**: concurrent edits are reported as
//!   [`DiffItem`](merge::DiffItem)s and re-enter as ordinary mutations
//! - **Pluggable storage**: anything implementing [`StateStore`](storage::StateStore)
//!
//! ## Usage
//!
//! ```
//! use flowstate::{ClientId, NewEdge, NewNode, StateManager};
//! use flowstate::storage::MemoryStore;
//!
//! # tokio_test::block_on(async {
//! // Generated once and persisted by the embedding application.
//! let client = ClientId::new("device-a");
//! let mut manager = StateManager::new(client, MemoryStore::new());
//! manager.load_state().await.unwrap();
//!
//! let idea = manager.add_node(NewNode::new().with_data("label", "Idea").at(120.0, 40.0)).unwrap();
//! manager.add_edge(NewEdge::new("root", idea.id.clone())).unwrap();
//!
//! assert!(manager.delete_node("root"));
//! assert!(manager.get_state().edges.is_empty());
//! # });
//! ```
//!
//! ## Module Structure
//!
//! - **[version]** - [`ClientId`], [`VersionVector`] and [`Causality`]
//! - **[types]** - Nodes, edges, viewport and [`GraphState`]
//! - **[state]** - [`StateManager`], undo history, persistence, configuration
//! - **[merge]** - Merge outcomes and the conflict-resolution contract
//! - **[storage]** - The [`StateStore`](storage::StateStore) trait and stores
//! - **[error]** - Error type and result alias

pub mod error;
pub mod merge;
pub mod state;
pub mod storage;
pub mod types;
pub mod version;

pub use error::{GraphError, Result};
pub use merge::{ConflictSet, DiffItem, MergeOutcome, Resolution};
pub use state::{EngineConfig, LoadOutcome, PersistenceStatus, StateManager};
pub use storage::{FileStore, MemoryStore, StateStore};
pub use types::{
    Edge, EdgeKind, EdgeUpdate, GraphState, NewEdge, NewNode, Node, NodeKind, NodeUpdate,
    Position, Viewport,
};
pub use version::{Causality, ClientId, VersionVector};
