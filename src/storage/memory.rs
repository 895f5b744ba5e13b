//! In-process snapshot store.
//!
//! Snapshots are kept as owned clones in a map behind a `parking_lot::RwLock`.
//! Every clone of a [`MemoryStore`] is a handle to the same map, so a test can
//! keep one handle and give another to the engine.

use super::StateStore;
use crate::error::{GraphError, Result};
use crate::types::GraphState;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    entries: RwLock<HashMap<String, GraphState>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

/// Shared in-memory store.
///
/// # Examples
///
/// ```
/// use flowstate::storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// let handle = store.clone();
/// assert_eq!(handle.save_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail (or succeed again).
    ///
    /// Used to exercise the engine's behavior when the local store is full or
    /// unavailable.
    pub fn set_failing(&self, failing: bool) {
        self.inner.fail_saves.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.inner.save_count.load(Ordering::SeqCst)
    }

    /// Synchronous peek at a stored snapshot.
    pub fn get(&self, key: &str) -> Option<GraphState> {
        self.inner.entries.read().get(key).cloned()
    }

    /// Seed a snapshot without going through the async API.
    pub fn insert(&self, key: &str, state: GraphState) {
        self.inner.entries.write().insert(key.to_string(), state);
    }

    /// List stored keys in arbitrary order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.entries.read().keys().cloned().collect()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn save(&self, key: &str, state: &GraphState) -> Result<()> {
        if self.inner.fail_saves.load(Ordering::SeqCst) {
            return Err(GraphError::Storage(format!("save of '{}' rejected", key)));
        }
        self.inner
            .entries
            .write()
            .insert(key.to_string(), state.clone());
        self.inner.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<GraphState>> {
        Ok(self.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::ClientId;

    #[tokio::test]
    async fn test_missing_key_loads_none() {
        let store = MemoryStore::new();
        assert!(store.load("flow-state").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clone_shares_contents() {
        let store = MemoryStore::new();
        let handle = store.clone();
        let state = GraphState::new(&ClientId::new("A"));

        store.save("flow-state", &state).await.unwrap();
        assert_eq!(handle.get("flow-state"), Some(state));
        assert_eq!(handle.save_count(), 1);
        assert_eq!(handle.keys(), vec!["flow-state".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let state = GraphState::new(&ClientId::new("A"));

        let err = store.save("flow-state", &state).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(store.get("flow-state").is_none());

        store.set_failing(false);
        assert!(store.save("flow-state", &state).await.is_ok());
    }
}
