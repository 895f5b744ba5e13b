//! Engine configuration.

use crate::storage::DEFAULT_STORAGE_KEY;
use serde::{Deserialize, Serialize};

/// Default number of undo snapshots retained.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Configuration for a [`StateManager`](crate::StateManager).
///
/// # Examples
///
/// ```
/// use flowstate::EngineConfig;
///
/// let config = EngineConfig {
///     history_limit: 100,
///     max_retries: 5,
///     ..Default::default()
/// };
/// assert_eq!(config.storage_key, "flow-state");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Key the live graph is saved under
    pub storage_key: String,
    /// Maximum number of undo snapshots; the oldest is evicted beyond this
    pub history_limit: usize,
    /// Retries for a failed save before it is left to the next write
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries
    pub retry_delay_ms: u64,
    /// Reject edges whose endpoints are not existing nodes
    pub strict_edges: bool,
    /// Emit warnings for persistence retries
    pub enable_logging: bool,
}

impl EngineConfig {
    /// Use a different storage key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Change the undo bound.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Change the retry policy.
    pub fn with_retries(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Toggle endpoint checking for edges.
    pub fn with_strict_edges(mut self, strict: bool) -> Self {
        self.strict_edges = strict;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_retries: 3,
            retry_delay_ms: 100,
            strict_edges: false,
            enable_logging: true,
        }
    }
}
