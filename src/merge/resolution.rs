use super::conflict::{ConflictSet, DiffItem};
use crate::types::{Edge, Node};
use serde::{Deserialize, Serialize};

/// A resolver's decision for one conflicting entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Choice<T> {
    /// Keep this client's copy
    Local,
    /// Take the remote copy
    Remote,
    /// Use a value the resolver built itself
    Merged(T),
}

impl<T: Clone> DiffItem<T> {
    /// The entity selected by `choice`.
    pub fn choose(&self, choice: Choice<T>) -> T {
        match choice {
            Choice::Local => self.local.clone(),
            Choice::Remote => self.remote.clone(),
            Choice::Merged(value) => value,
        }
    }

    /// The attached merged value, falling back to the local copy.
    pub fn merged_or_local(&self) -> T {
        self.merged.clone().unwrap_or_else(|| self.local.clone())
    }
}

/// Entities to re-apply after a conflict, as returned by a resolver.
///
/// [`StateManager::apply_resolution`](crate::StateManager::apply_resolution)
/// turns each entry into an ordinary update (id exists locally) or insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Nodes to write
    #[serde(default)]
    pub resolved_nodes: Vec<Node>,
    /// Edges to write
    #[serde(default)]
    pub resolved_edges: Vec<Edge>,
}

impl Resolution {
    /// Empty resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also adopt every entity only the remote copy had.
    pub fn with_remote_additions(mut self, conflicts: &ConflictSet) -> Self {
        self.resolved_nodes
            .extend(conflicts.remote_only_nodes.iter().cloned());
        self.resolved_edges
            .extend(conflicts.remote_only_edges.iter().cloned());
        self
    }

    /// Nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.resolved_nodes.is_empty() && self.resolved_edges.is_empty()
    }
}

impl ConflictSet {
    /// Build a resolution by asking for a [`Choice`] per conflicting entity.
    pub fn resolve<FN, FE>(&self, mut node_choice: FN, mut edge_choice: FE) -> Resolution
    where
        FN: FnMut(&DiffItem<Node>) -> Choice<Node>,
        FE: FnMut(&DiffItem<Edge>) -> Choice<Edge>,
    {
        Resolution {
            resolved_nodes: self
                .conflicting_nodes
                .iter()
                .map(|item| item.choose(node_choice(item)))
                .collect(),
            resolved_edges: self
                .conflicting_edges
                .iter()
                .map(|item| item.choose(edge_choice(item)))
                .collect(),
        }
    }

    /// Keep every local copy.
    pub fn keep_local(&self) -> Resolution {
        self.resolve(|_| Choice::Local, |_| Choice::Local)
    }

    /// Take every remote copy.
    pub fn keep_remote(&self) -> Resolution {
        self.resolve(|_| Choice::Remote, |_| Choice::Remote)
    }

    /// Use each item's attached `merged` value, or the local copy without one.
    pub fn use_merged(&self) -> Resolution {
        self.resolve(
            |item| Choice::Merged(item.merged_or_local()),
            |item| Choice::Merged(item.merged_or_local()),
        )
    }
}
