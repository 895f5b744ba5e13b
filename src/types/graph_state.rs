use super::{now, Edge, Node, NodeKind, Payload, Position, Viewport};
use crate::error::{EntityKind, GraphError, Result};
use crate::version::{ClientId, VersionVector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Id of the node installed when nothing has been persisted yet.
pub const PLACEHOLDER_NODE_ID: &str = "root";

/// The complete versioned graph: unit of persistence, undo and merge.
///
/// # Invariants
///
/// - Node ids are unique, edge ids are unique
/// - Every node and edge passes its own shape check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphState {
    /// Nodes in insertion order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in insertion order
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Camera state
    #[serde(default)]
    pub viewport: Viewport,
    /// Causal history of this copy
    pub version_vector: VersionVector,
}

impl GraphState {
    /// Empty graph whose vector records `client` at 1.
    pub fn new(client: &ClientId) -> Self {
        GraphState {
            nodes: Vec::new(),
            edges: Vec::new(),
            viewport: Viewport::default(),
            version_vector: VersionVector::new(client),
        }
    }

    /// Deterministic first-run graph: a single placeholder node at the origin.
    pub fn placeholder(client: &ClientId) -> Self {
        let mut data = Payload::new();
        data.insert("label".to_string(), "Start here".into());

        let mut state = GraphState::new(client);
        state.nodes.push(Node {
            id: PLACEHOLDER_NODE_ID.to_string(),
            kind: NodeKind::Default,
            position: Position::default(),
            data,
            version: 1,
            last_modified: now(),
            created_by: client.clone(),
        });
        state
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub(crate) fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub(crate) fn edge_index(&self, id: &str) -> Option<usize> {
        self.edges.iter().position(|e| e.id == id)
    }

    /// Whether a node with this id exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index(id).is_some()
    }

    /// Edges whose source or target is `node_id`.
    pub fn edges_touching<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(node_id))
    }

    /// Edges naming a node that is not in the graph.
    pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges
            .iter()
            .filter(|e| !self.contains_node(&e.source) || !self.contains_node(&e.target))
    }

    /// Shape check for a whole state, e.g. one arriving from a remote copy.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            node.validate()?;
            if !seen.insert(node.id.as_str()) {
                return Err(GraphError::InvalidEntity(format!("duplicate node id: {}", node.id)));
            }
        }

        let mut seen = HashSet::with_capacity(self.edges.len());
        for edge in &self.edges {
            edge.validate()?;
            if !seen.insert(edge.id.as_str()) {
                return Err(GraphError::InvalidEntity(format!("duplicate edge id: {}", edge.id)));
            }
        }

        self.viewport.validate()
    }

    /// Reject an insert whose id is already taken.
    pub(crate) fn ensure_absent(&self, kind: EntityKind, id: &str) -> Result<()> {
        let taken = match kind {
            EntityKind::Node => self.node_index(id).is_some(),
            EntityKind::Edge => self.edge_index(id).is_some(),
        };
        if taken {
            return Err(GraphError::InvalidEntity(format!("{} id already exists: {}", kind, id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewEdge, NewNode};

    fn client() -> ClientId {
        ClientId::new("A")
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        let a = GraphState::placeholder(&client());
        let b = GraphState::placeholder(&client());
        assert_eq!(a.nodes.len(), 1);
        assert_eq!(a.nodes[0].id, PLACEHOLDER_NODE_ID);
        assert_eq!(a.nodes[0].data, b.nodes[0].data);
        assert_eq!(a.version_vector, b.version_vector);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut state = GraphState::new(&client());
        let node = NewNode::new().with_id("n1").into_node(&client()).unwrap();
        state.nodes.push(node.clone());
        assert!(state.validate().is_ok());

        state.nodes.push(node);
        assert!(state.validate().unwrap_err().is_invalid());
    }

    #[test]
    fn test_dangling_edges() {
        let mut state = GraphState::placeholder(&client());
        state
            .edges
            .push(NewEdge::new(PLACEHOLDER_NODE_ID, "ghost").into_edge(&client()).unwrap());
        assert_eq!(state.dangling_edges().count(), 1);
        assert_eq!(state.edges_touching(PLACEHOLDER_NODE_ID).count(), 1);
    }

    #[test]
    fn test_deserializes_browser_snapshot() {
        let json = serde_json::json!({
            "nodes": [{
                "id": "1",
                "type": "input",
                "position": {"x": 250.0, "y": 5.0},
                "data": {"label": "Hello"},
                "version": 3,
                "lastModified": "2024-05-01T12:00:00Z",
                "createdBy": "device-a"
            }],
            "edges": [],
            "viewport": {"x": 0.0, "y": 0.0, "zoom": 1.5},
            "versionVector": {"device-a": 4}
        });
        let state: GraphState = serde_json::from_value(json).unwrap();
        assert_eq!(state.nodes[0].version, 3);
        assert_eq!(state.version_vector.get(&ClientId::new("device-a")), 4);
        assert!(state.validate().is_ok());
    }
}
