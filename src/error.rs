//! Error types for the state engine.
//!
//! All fallible operations return [`Result<T>`], an alias over [`GraphError`].
//! Validation and lookup failures are raised before any state change, so a
//! returned error always means the live graph is exactly as it was.
//!
//! Merge conflicts are deliberately *not* errors; they are reported through
//! [`MergeOutcome::Conflict`](crate::merge::MergeOutcome::Conflict).

use std::fmt;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Which kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A graph node
    Node,
    /// A graph edge
    Edge,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Node => write!(f, "node"),
            EntityKind::Edge => write!(f, "edge"),
        }
    }
}

/// Errors produced by the state engine and its storage collaborators.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The entity (or incoming state) failed the shape checks.
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    /// Update targeted an id that does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind that was looked up
        kind: EntityKind,
        /// Id that was not present
        id: String,
    },

    /// The storage collaborator reported a failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem failure in a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The background persistence writer has shut down.
    #[error("Persistence writer closed")]
    PersistenceClosed,
}

impl GraphError {
    /// Shorthand for a missing node.
    pub fn node_not_found(id: impl Into<String>) -> Self {
        GraphError::NotFound {
            kind: EntityKind::Node,
            id: id.into(),
        }
    }

    /// Shorthand for a missing edge.
    pub fn edge_not_found(id: impl Into<String>) -> Self {
        GraphError::NotFound {
            kind: EntityKind::Edge,
            id: id.into(),
        }
    }

    /// True for [`GraphError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }

    /// True for [`GraphError::InvalidEntity`].
    pub fn is_invalid(&self) -> bool {
        matches!(self, GraphError::InvalidEntity(_))
    }

    /// Whether a failed save is worth retrying.
    ///
    /// Storage and I/O failures are transient from the engine's point of view;
    /// a snapshot that cannot be serialized will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GraphError::Storage(_) | GraphError::Io(_))
    }
}
