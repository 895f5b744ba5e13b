use crate::types::{Edge, GraphState, Node};
use crate::version::VersionVector;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Both copies of one entity that diverged between two concurrent states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffItem<T> {
    /// Copy held by this client
    pub local: T,
    /// Copy held by the remote state
    pub remote: T,
    /// Value supplied by the resolver, if it merged the two itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged: Option<T>,
}

impl<T> DiffItem<T> {
    /// Pair with no merged value yet.
    pub fn new(local: T, remote: T) -> Self {
        DiffItem {
            local,
            remote,
            merged: None,
        }
    }

    /// Attach a resolver-provided merged value.
    pub fn with_merged(mut self, merged: T) -> Self {
        self.merged = Some(merged);
        self
    }
}

/// Everything a resolver needs after a concurrent merge.
///
/// Only ids present on both sides with different version or content appear in
/// `conflicting_nodes` / `conflicting_edges`. Entities that only the remote
/// copy has are listed separately and are never applied unless the resolver
/// opts in; the engine cannot tell a remote addition from a local deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSet {
    /// Nodes edited on both sides
    pub conflicting_nodes: Vec<DiffItem<Node>>,
    /// Edges edited on both sides
    pub conflicting_edges: Vec<DiffItem<Edge>>,
    /// Nodes only the remote copy has
    #[serde(default)]
    pub remote_only_nodes: Vec<Node>,
    /// Edges only the remote copy has
    #[serde(default)]
    pub remote_only_edges: Vec<Edge>,
    /// Vector the local state adopted when the conflict was detected
    pub merged_vector: VersionVector,
}

impl ConflictSet {
    /// Diff two concurrent states, in local order.
    pub fn between(local: &GraphState, remote: &GraphState) -> Self {
        let remote_nodes: HashMap<&str, &Node> =
            remote.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let remote_edges: HashMap<&str, &Edge> =
            remote.edges.iter().map(|e| (e.id.as_str(), e)).collect();

        let conflicting_nodes = local
            .nodes
            .iter()
            .filter_map(|ours| {
                let theirs = remote_nodes.get(ours.id.as_str())?;
                ours.diverges_from(theirs)
                    .then(|| DiffItem::new(ours.clone(), (*theirs).clone()))
            })
            .collect();

        let conflicting_edges = local
            .edges
            .iter()
            .filter_map(|ours| {
                let theirs = remote_edges.get(ours.id.as_str())?;
                ours.diverges_from(theirs)
                    .then(|| DiffItem::new(ours.clone(), (*theirs).clone()))
            })
            .collect();

        let local_nodes: HashSet<&str> = local.nodes.iter().map(|n| n.id.as_str()).collect();
        let local_edges: HashSet<&str> = local.edges.iter().map(|e| e.id.as_str()).collect();

        ConflictSet {
            conflicting_nodes,
            conflicting_edges,
            remote_only_nodes: remote
                .nodes
                .iter()
                .filter(|n| !local_nodes.contains(n.id.as_str()))
                .cloned()
                .collect(),
            remote_only_edges: remote
                .edges
                .iter()
                .filter(|e| !local_edges.contains(e.id.as_str()))
                .cloned()
                .collect(),
            merged_vector: local.version_vector.merged(&remote.version_vector),
        }
    }

    /// True when no shared entity diverged.
    ///
    /// Vectors can be concurrent while content agrees, e.g. when both sides
    /// only moved the viewport.
    pub fn is_empty(&self) -> bool {
        self.conflicting_nodes.is_empty() && self.conflicting_edges.is_empty()
    }

    /// Number of diverged entities.
    pub fn len(&self) -> usize {
        self.conflicting_nodes.len() + self.conflicting_edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewEdge, NewNode, NodeUpdate};
    use crate::version::ClientId;

    fn base() -> GraphState {
        let a = ClientId::new("A");
        let mut state = GraphState::new(&a);
        state.nodes.push(NewNode::new().with_id("n1").into_node(&a).unwrap());
        state.nodes.push(NewNode::new().with_id("n2").into_node(&a).unwrap());
        state
            .edges
            .push(NewEdge::new("n1", "n2").with_id("e1").into_edge(&a).unwrap());
        state
    }

    #[test]
    fn test_unchanged_entities_are_not_conflicts() {
        let local = base();
        let remote = local.clone();
        let set = ConflictSet::between(&local, &remote);
        assert!(set.is_empty());
        assert!(set.remote_only_nodes.is_empty());
    }

    #[test]
    fn test_diverged_node_reported_once() {
        let local = base();
        let mut remote = local.clone();
        NodeUpdate::new().position(5.0, 5.0).apply_to(&mut remote.nodes[0]);
        remote.version_vector = remote.version_vector.incremented(&ClientId::new("B"));

        let set = ConflictSet::between(&local, &remote);
        assert_eq!(set.len(), 1);
        assert_eq!(set.conflicting_nodes[0].local.id, "n1");
        assert_eq!(set.conflicting_nodes[0].remote.version, 2);
        assert_eq!(set.merged_vector.get(&ClientId::new("B")), 1);
    }

    #[test]
    fn test_remote_only_entities_listed_separately() {
        let local = base();
        let mut remote = local.clone();
        let b = ClientId::new("B");
        remote
            .nodes
            .push(NewNode::new().with_id("n3").into_node(&b).unwrap());

        let set = ConflictSet::between(&local, &remote);
        assert!(set.is_empty());
        assert_eq!(set.remote_only_nodes.len(), 1);
        assert_eq!(set.remote_only_nodes[0].id, "n3");
    }

    #[test]
    fn test_serializes_with_resolution_ui_names() {
        let set = ConflictSet::between(&base(), &base());
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.get("conflictingNodes").is_some());
        assert!(json.get("conflictingEdges").is_some());
    }

    #[test]
    fn test_deserializes_from_resolution_ui() {
        let local = base();
        let mut remote = local.clone();
        NodeUpdate::new().position(5.0, 5.0).apply_to(&mut remote.nodes[0]);
        remote.version_vector = remote.version_vector.incremented(&ClientId::new("B"));
        let set = ConflictSet::between(&local, &remote);

        let json = serde_json::to_value(&set).unwrap();
        assert!(json["conflictingNodes"][0].get("merged").is_none());

        let back: ConflictSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
        assert!(back.conflicting_nodes[0].merged.is_none());
    }
}
