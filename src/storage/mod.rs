//! Persistence collaborators.
//!
//! The engine never touches a disk or a database directly. It talks to an
//! injected [`StateStore`], which saves and loads whole [`GraphState`]
//! snapshots under a string key (`"flow-state"` by default).
//!
//! | Store | Backing |
//! |-------|---------|
//! | [`MemoryStore`] | Shared in-process map; cloning shares contents |
//! | [`FileStore`] | One JSON document per key inside a directory |
//!
//! # Examples
//!
//! ```
//! use flowstate::storage::{MemoryStore, StateStore};
//! use flowstate::{ClientId, GraphState};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let state = GraphState::new(&ClientId::new("A"));
//!
//! store.save("flow-state", &state).await.unwrap();
//! let loaded = store.load("flow-state").await.unwrap();
//! assert_eq!(loaded, Some(state));
//! # });
//! ```

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::types::GraphState;
use async_trait::async_trait;

/// Key under which the live graph is stored unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "flow-state";

/// Asynchronous key/value store for graph snapshots.
///
/// Implementations must be safe to call from a background task; the engine
/// issues at most one `save` at a time.
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Durably store `state` under `key`, replacing any previous value.
    async fn save(&self, key: &str, state: &GraphState) -> Result<()>;

    /// Read the value stored under `key`, or `None` if there is none.
    async fn load(&self, key: &str) -> Result<Option<GraphState>>;
}
