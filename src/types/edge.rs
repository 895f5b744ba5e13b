use super::{new_entity_id, now, require_non_empty, Payload, Timestamp};
use crate::error::Result;
use crate::version::ClientId;
use serde::{Deserialize, Serialize};

/// Rendering tag for an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Bezier curve
    #[default]
    Default,
    /// Straight line
    Straight,
    /// Right-angled steps
    Step,
    /// Right-angled steps with rounded corners
    SmoothStep,
    /// Simplified bezier
    SimpleBezier,
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique identifier
    pub id: String,
    /// Id of the source node
    pub source: String,
    /// Id of the target node
    pub target: String,
    /// Rendering tag
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    /// Opaque payload
    #[serde(default)]
    pub data: Payload,
    /// Per-edge write counter
    pub version: u64,
    /// Time of the last write
    pub last_modified: Timestamp,
    /// Client that created the edge
    pub created_by: ClientId,
}

impl Edge {
    /// Shape check: id, source and target must all be non-empty.
    pub fn validate(&self) -> Result<()> {
        require_non_empty("edge id", &self.id)?;
        require_non_empty("edge source", &self.source)?;
        require_non_empty("edge target", &self.target)
    }

    /// Whether the edge touches `node_id` at either end.
    #[inline]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// Whether two copies of the same edge differ in version or content.
    pub fn diverges_from(&self, other: &Edge) -> bool {
        self.version != other.version
            || self.source != other.source
            || self.target != other.target
            || self.kind != other.kind
            || self.data != other.data
    }
}

/// Input for creating an edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEdge {
    /// Caller-chosen id; a UUID is assigned when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Id of the source node
    pub source: String,
    /// Id of the target node
    pub target: String,
    /// Rendering tag
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    /// Opaque payload
    #[serde(default)]
    pub data: Payload,
}

impl NewEdge {
    /// Edge input between two node ids.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        NewEdge {
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    /// Use a specific id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the rendering tag.
    pub fn with_kind(mut self, kind: EdgeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set one payload entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub(crate) fn into_edge(self, client: &ClientId) -> Result<Edge> {
        let id = match self.id {
            Some(id) => id,
            None => new_entity_id(),
        };
        let edge = Edge {
            id,
            source: self.source,
            target: self.target,
            kind: self.kind,
            data: self.data,
            version: 1,
            last_modified: now(),
            created_by: client.clone(),
        };
        edge.validate()?;
        Ok(edge)
    }
}

impl From<Edge> for NewEdge {
    fn from(edge: Edge) -> Self {
        NewEdge {
            id: Some(edge.id),
            source: edge.source,
            target: edge.target,
            kind: edge.kind,
            data: edge.data,
        }
    }
}

/// Partial update for an existing edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeUpdate {
    /// New source node id
    #[serde(default)]
    pub source: Option<String>,
    /// New target node id
    #[serde(default)]
    pub target: Option<String>,
    /// New rendering tag
    #[serde(rename = "type", default)]
    pub kind: Option<EdgeKind>,
    /// New payload
    #[serde(default)]
    pub data: Option<Payload>,
}

impl EdgeUpdate {
    /// Update that changes nothing but still bumps the version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconnect both ends.
    pub fn endpoints(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self.target = Some(target.into());
        self
    }

    /// Change the rendering tag.
    pub fn kind(mut self, kind: EdgeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Replace the payload.
    pub fn data(mut self, data: Payload) -> Self {
        self.data = Some(data);
        self
    }

    /// Validate the fields this update would write.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(source) = &self.source {
            require_non_empty("edge source", source)?;
        }
        if let Some(target) = &self.target {
            require_non_empty("edge target", target)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, edge: &mut Edge) {
        if let Some(source) = self.source {
            edge.source = source;
        }
        if let Some(target) = self.target {
            edge.target = target;
        }
        if let Some(kind) = self.kind {
            edge.kind = kind;
        }
        if let Some(data) = self.data {
            edge.data = data;
        }
        edge.version += 1;
        edge.last_modified = now();
    }
}

impl From<Edge> for EdgeUpdate {
    fn from(edge: Edge) -> Self {
        EdgeUpdate {
            source: Some(edge.source),
            target: Some(edge.target),
            kind: Some(edge.kind),
            data: Some(edge.data),
        }
    }
}
