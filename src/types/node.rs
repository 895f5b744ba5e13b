use super::{new_entity_id, now, require_non_empty, Payload, Timestamp};
use crate::error::Result;
use crate::version::ClientId;
use serde::{Deserialize, Serialize};

/// Rendering tag for a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Plain node with inbound and outbound handles
    #[default]
    Default,
    /// Source-only node
    Input,
    /// Sink-only node
    Output,
    /// Container for other nodes
    Group,
}

/// Canvas coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal offset
    pub x: f64,
    /// Vertical offset
    pub y: f64,
}

impl Position {
    /// Construct a position.
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

/// A node in the graph.
///
/// `version` starts at 1 and is bumped by every update to this node; it is
/// independent of the state-level version vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique, stable identifier
    pub id: String,
    /// Rendering tag
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    /// Canvas position
    #[serde(default)]
    pub position: Position,
    /// Opaque payload
    #[serde(default)]
    pub data: Payload,
    /// Per-node write counter
    pub version: u64,
    /// Time of the last write
    pub last_modified: Timestamp,
    /// Client that created the node
    pub created_by: ClientId,
}

impl Node {
    /// Shape check: the id must be non-empty.
    pub fn validate(&self) -> Result<()> {
        require_non_empty("node id", &self.id)
    }

    /// Whether two copies of the same node differ in version or content.
    ///
    /// `last_modified` alone does not count; two writes that produce the same
    /// version and content are the same node.
    pub fn diverges_from(&self, other: &Node) -> bool {
        self.version != other.version
            || self.kind != other.kind
            || self.position != other.position
            || self.data != other.data
    }
}

/// Input for creating a node. Missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    /// Caller-chosen id; a UUID is assigned when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Rendering tag
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    /// Canvas position
    #[serde(default)]
    pub position: Position,
    /// Opaque payload
    #[serde(default)]
    pub data: Payload,
}

impl NewNode {
    /// Empty node input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the rendering tag.
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Set one payload entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Finalize into a version-1 node owned by `client`.
    pub(crate) fn into_node(self, client: &ClientId) -> Result<Node> {
        let id = match self.id {
            Some(id) => id,
            None => new_entity_id(),
        };
        let node = Node {
            id,
            kind: self.kind,
            position: self.position,
            data: self.data,
            version: 1,
            last_modified: now(),
            created_by: client.clone(),
        };
        node.validate()?;
        Ok(node)
    }
}

impl From<Node> for NewNode {
    fn from(node: Node) -> Self {
        NewNode {
            id: Some(node.id),
            kind: node.kind,
            position: node.position,
            data: node.data,
        }
    }
}

/// Partial update for an existing node. `None` fields are left as they are;
/// `data`, when present, replaces the payload wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    /// New rendering tag
    #[serde(rename = "type", default)]
    pub kind: Option<NodeKind>,
    /// New position
    #[serde(default)]
    pub position: Option<Position>,
    /// New payload
    #[serde(default)]
    pub data: Option<Payload>,
}

impl NodeUpdate {
    /// Update that changes nothing but still bumps the version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the node.
    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    /// Change the rendering tag.
    pub fn kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Replace the payload.
    pub fn data(mut self, data: Payload) -> Self {
        self.data = Some(data);
        self
    }

    /// Apply onto `node`, bumping its version and timestamp.
    pub(crate) fn apply_to(self, node: &mut Node) {
        if let Some(kind) = self.kind {
            node.kind = kind;
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(data) = self.data {
            node.data = data;
        }
        node.version += 1;
        node.last_modified = now();
    }
}

impl From<Node> for NodeUpdate {
    /// Full overwrite with the content of `node`.
    fn from(node: Node) -> Self {
        NodeUpdate {
            kind: Some(node.kind),
            position: Some(node.position),
            data: Some(node.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_assigns_id_and_version() {
        let client = ClientId::new("A");
        let node = NewNode::new().with_data("title", "X").into_node(&client).unwrap();
        assert!(!node.id.is_empty());
        assert_eq!(node.version, 1);
        assert_eq!(node.created_by, client);
        assert_eq!(node.kind, NodeKind::Default);
    }

    #[test]
    fn test_empty_id_rejected() {
        let err = NewNode::new().with_id("  ").into_node(&ClientId::new("A")).unwrap_err();
        assert!(err.is_invalid());
    }

    #[test]
    fn test_update_bumps_version() {
        let mut node = NewNode::new().with_id("n1").into_node(&ClientId::new("A")).unwrap();
        NodeUpdate::new().position(10.0, 20.0).apply_to(&mut node);
        assert_eq!(node.version, 2);
        assert_eq!(node.position, Position::new(10.0, 20.0));
    }

    #[test]
    fn test_divergence_ignores_timestamp() {
        let a = NewNode::new().with_id("n1").into_node(&ClientId::new("A")).unwrap();
        let mut b = a.clone();
        b.last_modified = a.last_modified + chrono::Duration::seconds(5);
        assert!(!a.diverges_from(&b));

        b.data.insert("title".into(), "changed".into());
        assert!(a.diverges_from(&b));
    }

    #[test]
    fn test_serde_uses_browser_field_names() {
        let node = NewNode::new().with_id("n1").into_node(&ClientId::new("A")).unwrap();
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "default");
        assert_eq!(json["createdBy"], "A");
        assert!(json.get("lastModified").is_some());
    }
}
