//! Versioned data shapes manipulated by the engine.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Node`] | A mind-map node with its own per-entity version |
//! | [`Edge`] | A connection between two nodes |
//! | [`Viewport`] | Camera position and zoom |
//! | [`GraphState`] | Everything above plus the state-level [`VersionVector`] |
//! | [`NewNode`] / [`NodeUpdate`] | Partial inputs for node mutations |
//! | [`NewEdge`] / [`EdgeUpdate`] | Partial inputs for edge mutations |
//!
//! Serialized field names follow the camelCase shape used by the browser
//! client (`lastModified`, `createdBy`, `versionVector`), so snapshots written
//! by either side can be read by the other.
//!
//! [`VersionVector`]: crate::version::VersionVector

mod edge;
mod graph_state;
mod node;
mod viewport;

pub use edge::{Edge, EdgeKind, EdgeUpdate, NewEdge};
pub use graph_state::{GraphState, PLACEHOLDER_NODE_ID};
pub use node::{NewNode, Node, NodeKind, NodeUpdate, Position};
pub use viewport::Viewport;

use crate::error::{GraphError, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Free-form entity payload.
///
/// The engine treats it as opaque: it is compared for equality when building a
/// conflict set and otherwise carried through untouched.
pub type Payload = BTreeMap<String, serde_json::Value>;

/// Wall-clock timestamp attached to every entity write.
pub type Timestamp = DateTime<Utc>;

pub(crate) fn now() -> Timestamp {
    Utc::now()
}

pub(crate) fn new_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GraphError::InvalidEntity(format!("{} must not be empty", what)));
    }
    Ok(())
}
