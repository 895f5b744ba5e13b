//! The live graph and every transition it can make.
//!
//! [`StateManager`] owns exactly one [`GraphState`] and its [`HistoryStack`].
//! Every mutation follows the same path:
//!
//! 1. validate (a rejected mutation changes nothing, history included)
//! 2. push a snapshot of the current state onto history
//! 3. apply the change
//! 4. bump this client's entry in the state vector
//! 5. hand the new state to the background writer and return
//!
//! Conflict resolution goes through the same mutators, so there is a single
//! code path for state transitions.

use super::config::EngineConfig;
use super::history::HistoryStack;
use super::persistence::{PersistenceStatus, Persister};
use crate::error::{EntityKind, GraphError, Result};
use crate::merge::{ConflictSet, MergeOutcome, Resolution};
use crate::storage::StateStore;
use crate::types::{
    Edge, EdgeUpdate, GraphState, NewEdge, NewNode, Node, NodeUpdate, Viewport,
};
use crate::version::{Causality, ClientId};
use std::collections::HashSet;
use std::sync::Arc;

/// What [`StateManager::load_state`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A stored graph was installed
    Restored,
    /// Nothing was stored; the placeholder graph was installed and saved
    Initialized,
}

/// Owner of the live graph.
///
/// Mutators take `&mut self` and run to completion synchronously; only
/// [`load_state`](Self::load_state) and [`merge_state`](Self::merge_state)
/// await I/O. Construction spawns the persistence writer, so it must happen
/// inside a Tokio runtime.
///
/// # Examples
///
/// ```
/// use flowstate::{ClientId, NewNode, StateManager};
/// use flowstate::storage::MemoryStore;
///
/// # tokio_test::block_on(async {
/// let mut manager = StateManager::new(ClientId::new("A"), MemoryStore::new());
///
/// let node = manager.add_node(NewNode::new().with_data("title", "X")).unwrap();
/// assert_eq!(node.version, 1);
/// assert_eq!(manager.get_state().version_vector.to_string(), "{A:2}");
///
/// assert!(manager.undo());
/// assert!(manager.get_state().nodes.is_empty());
/// # });
/// ```
pub struct StateManager {
    client_id: ClientId,
    state: GraphState,
    history: HistoryStack,
    store: Arc<dyn StateStore>,
    persister: Persister,
    config: EngineConfig,
    conflict: Option<ConflictSet>,
}

impl StateManager {
    /// Manager with default configuration and an empty graph.
    pub fn new(client_id: ClientId, store: impl StateStore) -> Self {
        Self::with_config(client_id, store, EngineConfig::default())
    }

    /// Manager with custom configuration and an empty graph.
    ///
    /// The graph starts as `{nodes: [], edges: [], vv: {client: 1}}`; call
    /// [`load_state`](Self::load_state) to pick up whatever was persisted.
    pub fn with_config(client_id: ClientId, store: impl StateStore, config: EngineConfig) -> Self {
        let store: Arc<dyn StateStore> = Arc::new(store);
        let persister = Persister::spawn(Arc::clone(&store), &config);
        StateManager {
            state: GraphState::new(&client_id),
            history: HistoryStack::new(config.history_limit),
            client_id,
            store,
            persister,
            config,
            conflict: None,
        }
    }

    // ========== Queries ==========

    /// The live graph.
    #[inline]
    pub fn get_state(&self) -> &GraphState {
        &self.state
    }

    /// Identity this manager writes as.
    #[inline]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether [`undo`](Self::undo) would do anything.
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Number of undo snapshots held.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Conflict set from the last concurrent merge, until taken or superseded.
    pub fn pending_conflict(&self) -> Option<&ConflictSet> {
        self.conflict.as_ref()
    }

    /// Take ownership of the pending conflict set.
    pub fn take_conflict(&mut self) -> Option<ConflictSet> {
        self.conflict.take()
    }

    /// Whether the newest state has reached the store.
    pub fn persistence_status(&self) -> PersistenceStatus {
        self.persister.status()
    }

    /// Message of the most recent failed save while the state is still dirty.
    pub fn last_persistence_error(&self) -> Option<String> {
        self.persister.last_error()
    }

    /// Wait for every queued write to be attempted.
    pub async fn flush(&self) -> Result<()> {
        self.persister.flush().await
    }

    // ========== Node Operations ==========

    /// Insert a node. An id is generated when the input has none.
    pub fn add_node(&mut self, input: NewNode) -> Result<Node> {
        let node = input.into_node(&self.client_id)?;
        self.state.ensure_absent(EntityKind::Node, &node.id)?;

        self.snapshot();
        self.state.nodes.push(node.clone());
        self.commit("add_node", &node.id);
        Ok(node)
    }

    /// Apply a partial update and bump the node's own version.
    pub fn update_node(&mut self, id: &str, update: NodeUpdate) -> Result<Node> {
        let index = self
            .state
            .node_index(id)
            .ok_or_else(|| GraphError::node_not_found(id))?;

        self.snapshot();
        let node = &mut self.state.nodes[index];
        update.apply_to(node);
        let node = node.clone();
        self.commit("update_node", id);
        Ok(node)
    }

    /// Remove a node and every edge touching it.
    ///
    /// Returns `false`, changing nothing, when the id is unknown.
    pub fn delete_node(&mut self, id: &str) -> bool {
        let Some(index) = self.state.node_index(id) else {
            return false;
        };

        self.snapshot();
        self.state.nodes.remove(index);
        let before = self.state.edges.len();
        self.state.edges.retain(|edge| !edge.touches(id));
        tracing::trace!(node = id, removed = before - self.state.edges.len(), "cascaded edges");
        self.commit("delete_node", id);
        true
    }

    // ========== Edge Operations ==========

    /// Insert an edge. An id is generated when the input has none.
    pub fn add_edge(&mut self, input: NewEdge) -> Result<Edge> {
        let edge = input.into_edge(&self.client_id)?;
        self.state.ensure_absent(EntityKind::Edge, &edge.id)?;
        self.check_endpoints(&edge.id, &edge.source, &edge.target)?;

        self.snapshot();
        self.state.edges.push(edge.clone());
        self.commit("add_edge", &edge.id);
        Ok(edge)
    }

    /// Apply a partial update and bump the edge's own version.
    pub fn update_edge(&mut self, id: &str, update: EdgeUpdate) -> Result<Edge> {
        let index = self
            .state
            .edge_index(id)
            .ok_or_else(|| GraphError::edge_not_found(id))?;
        update.validate()?;
        {
            let current = &self.state.edges[index];
            let source = update.source.as_deref().unwrap_or(&current.source);
            let target = update.target.as_deref().unwrap_or(&current.target);
            self.check_endpoints(id, source, target)?;
        }

        self.snapshot();
        let edge = &mut self.state.edges[index];
        update.apply_to(edge);
        let edge = edge.clone();
        self.commit("update_edge", id);
        Ok(edge)
    }

    /// Remove an edge. Returns `false`, changing nothing, when unknown.
    pub fn delete_edge(&mut self, id: &str) -> bool {
        let Some(index) = self.state.edge_index(id) else {
            return false;
        };

        self.snapshot();
        self.state.edges.remove(index);
        self.commit("delete_edge", id);
        true
    }

    // ========== Viewport ==========

    /// Replace the viewport.
    pub fn update_viewport(&mut self, viewport: Viewport) -> Result<()> {
        viewport.validate()?;

        self.snapshot();
        self.state.viewport = viewport;
        self.commit("update_viewport", "viewport");
        Ok(())
    }

    // ========== History ==========

    /// Reinstall the snapshot taken before the most recent mutation.
    ///
    /// This restores the whole graph, vector included; it is not an inverse of
    /// one field change. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };

        self.state = previous;
        tracing::debug!(vector = %self.state.version_vector, "undo");
        self.persist();
        true
    }

    // ========== Persistence & Sync ==========

    /// Install the persisted graph, or the placeholder graph when none exists.
    ///
    /// History and any pending conflict are cleared either way.
    pub async fn load_state(&mut self) -> Result<LoadOutcome> {
        // Queued saves must land before the read, or they overwrite what we restore.
        self.flush_logged().await;
        let stored = self.store.load(&self.config.storage_key).await?;

        let outcome = match stored {
            Some(state) => {
                state.validate()?;
                self.state = state;
                LoadOutcome::Restored
            }
            None => {
                self.state = GraphState::placeholder(&self.client_id);
                self.persist();
                LoadOutcome::Initialized
            }
        };
        self.history.clear();
        self.conflict = None;

        if outcome == LoadOutcome::Initialized {
            self.flush_logged().await;
        }
        tracing::info!(
            ?outcome,
            nodes = self.state.nodes.len(),
            edges = self.state.edges.len(),
            vector = %self.state.version_vector,
            "graph state loaded"
        );
        Ok(outcome)
    }

    /// Reconcile with a snapshot from another copy of the graph.
    ///
    /// Ordered histories fast-forward or no-op. Concurrent histories adopt the
    /// merged vector and return [`MergeOutcome::Conflict`]; the local graph
    /// content is left as it was until a resolution is applied.
    pub async fn merge_state(&mut self, remote: GraphState) -> Result<MergeOutcome> {
        remote.validate()?;

        let causality = self.state.version_vector.compare(&remote.version_vector);
        let outcome = match causality {
            Causality::Equal => MergeOutcome::UpToDate,
            Causality::Descendant => MergeOutcome::LocalAhead,
            Causality::Ancestor => {
                self.snapshot();
                self.state = remote;
                self.conflict = None;
                self.persist();
                self.flush_logged().await;
                MergeOutcome::FastForward
            }
            Causality::Conflict => {
                let conflicts = ConflictSet::between(&self.state, &remote);
                self.state.version_vector = conflicts.merged_vector.clone();
                self.persist();
                self.flush_logged().await;
                self.conflict = Some(conflicts.clone());
                MergeOutcome::Conflict(conflicts)
            }
        };

        tracing::info!(
            ?causality,
            vector = %self.state.version_vector,
            conflicts = outcome.conflict().map_or(0, ConflictSet::len),
            "merge completed"
        );
        Ok(outcome)
    }

    /// Re-apply a resolver's decisions as new local mutations.
    ///
    /// Every entity is validated before anything is written. Nodes go first so
    /// that resolved edges find their endpoints. Each entity becomes one
    /// update (id exists locally) or insert, with its own undo snapshot.
    /// Returns the number of mutations applied.
    pub fn apply_resolution(&mut self, resolution: Resolution) -> Result<usize> {
        self.check_resolution(&resolution)?;

        let mut applied = 0;
        for node in resolution.resolved_nodes {
            if self.state.contains_node(&node.id) {
                let id = node.id.clone();
                self.update_node(&id, NodeUpdate::from(node))?;
            } else {
                self.add_node(NewNode::from(node))?;
            }
            applied += 1;
        }
        for edge in resolution.resolved_edges {
            if self.state.edge_index(&edge.id).is_some() {
                let id = edge.id.clone();
                self.update_edge(&id, EdgeUpdate::from(edge))?;
            } else {
                self.add_edge(NewEdge::from(edge))?;
            }
            applied += 1;
        }

        self.conflict = None;
        tracing::info!(applied, vector = %self.state.version_vector, "resolution applied");
        Ok(applied)
    }

    // ========== Internals ==========

    fn snapshot(&mut self) {
        self.history.push(&self.state);
    }

    fn commit(&mut self, op: &'static str, id: &str) {
        self.state.version_vector = self.state.version_vector.incremented(&self.client_id);
        tracing::debug!(op, id, vector = %self.state.version_vector, "mutation applied");
        self.persist();
    }

    fn persist(&self) {
        self.persister.enqueue(self.state.clone());
    }

    async fn flush_logged(&self) {
        if let Err(e) = self.persister.flush().await {
            tracing::warn!(error = %e, "graph state kept in memory only");
        }
    }

    /// Shape of every entity, plus edge endpoints against the graph as it will
    /// be once all resolved nodes are in place.
    fn check_resolution(&self, resolution: &Resolution) -> Result<()> {
        for node in &resolution.resolved_nodes {
            node.validate()?;
        }
        for edge in &resolution.resolved_edges {
            edge.validate()?;
        }
        if !self.config.strict_edges {
            return Ok(());
        }

        let known: HashSet<&str> = self
            .state
            .nodes
            .iter()
            .chain(&resolution.resolved_nodes)
            .map(|node| node.id.as_str())
            .collect();
        for edge in &resolution.resolved_edges {
            for endpoint in [&edge.source, &edge.target] {
                if !known.contains(endpoint.as_str()) {
                    return Err(unknown_endpoint(&edge.id, endpoint));
                }
            }
        }
        Ok(())
    }

    fn check_endpoints(&self, id: &str, source: &str, target: &str) -> Result<()> {
        for endpoint in [source, target] {
            if self.state.contains_node(endpoint) {
                continue;
            }
            if self.config.strict_edges {
                return Err(unknown_endpoint(id, endpoint));
            }
            tracing::warn!(edge = id, node = endpoint, "edge references unknown node");
        }
        Ok(())
    }
}

fn unknown_endpoint(edge: &str, node: &str) -> GraphError {
    GraphError::InvalidEntity(format!("edge {} references unknown node {}", edge, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::{EdgeKind, NodeKind, PLACEHOLDER_NODE_ID};
    use proptest::prelude::*;

    fn manager(client: &str) -> (StateManager, MemoryStore) {
        let store = MemoryStore::new();
        let manager = StateManager::new(ClientId::new(client), store.clone());
        (manager, store)
    }

    fn vector_of(manager: &StateManager, client: &str) -> u64 {
        manager.get_state().version_vector.get(&ClientId::new(client))
    }

    #[tokio::test]
    async fn test_add_node_scenario() {
        let (mut m, _) = manager("A");
        assert_eq!(vector_of(&m, "A"), 1);

        let node = m.add_node(NewNode::new().with_data("title", "X")).unwrap();
        assert_eq!(node.version, 1);
        assert_eq!(node.created_by, ClientId::new("A"));
        assert_eq!(vector_of(&m, "A"), 2);

        assert!(m.undo());
        assert!(m.get_state().nodes.is_empty());
        assert_eq!(vector_of(&m, "A"), 1);
        assert!(!m.undo());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected_without_side_effects() {
        let (mut m, _) = manager("A");
        m.add_node(NewNode::new().with_id("n1")).unwrap();
        let before = m.get_state().clone();

        let err = m.add_node(NewNode::new().with_id("n1")).unwrap_err();
        assert!(err.is_invalid());
        assert_eq!(m.get_state(), &before);
        assert_eq!(m.history_len(), 1);
    }

    #[tokio::test]
    async fn test_update_node() {
        let (mut m, _) = manager("A");
        m.add_node(NewNode::new().with_id("n1")).unwrap();

        let node = m
            .update_node("n1", NodeUpdate::new().position(3.0, 4.0).kind(NodeKind::Group))
            .unwrap();
        assert_eq!(node.version, 2);
        assert_eq!(node.kind, NodeKind::Group);
        assert_eq!(vector_of(&m, "A"), 3);
    }

    #[tokio::test]
    async fn test_update_missing_node_is_not_found() {
        let (mut m, _) = manager("A");
        let err = m.update_node("ghost", NodeUpdate::new()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(m.history_len(), 0);
        assert_eq!(vector_of(&m, "A"), 1);
    }

    #[tokio::test]
    async fn test_delete_node_cascades() {
        let (mut m, _) = manager("A");
        for id in ["n1", "n2", "n3"] {
            m.add_node(NewNode::new().with_id(id)).unwrap();
        }
        m.add_edge(NewEdge::new("n1", "n2").with_id("e1")).unwrap();
        m.add_edge(NewEdge::new("n2", "n3").with_id("e2")).unwrap();
        m.add_edge(NewEdge::new("n1", "n3").with_id("e3")).unwrap();

        assert!(m.delete_node("n2"));
        let state = m.get_state();
        assert!(state.edges_touching("n2").next().is_none());
        assert_eq!(state.edges.len(), 1);
        assert_eq!(state.edges[0].id, "e3");

        assert!(!m.delete_node("n2"));
    }

    #[tokio::test]
    async fn test_edge_operations() {
        let (mut m, _) = manager("A");
        m.add_node(NewNode::new().with_id("n1")).unwrap();
        m.add_node(NewNode::new().with_id("n2")).unwrap();

        let edge = m.add_edge(NewEdge::new("n1", "n2").with_id("e1")).unwrap();
        assert_eq!(edge.version, 1);

        let edge = m
            .update_edge("e1", EdgeUpdate::new().kind(EdgeKind::Step))
            .unwrap();
        assert_eq!(edge.version, 2);
        assert_eq!(edge.kind, EdgeKind::Step);

        assert!(m.update_edge("e1", EdgeUpdate::new().endpoints("", "n2")).is_err());
        assert!(m.update_edge("ghost", EdgeUpdate::new()).unwrap_err().is_not_found());

        assert!(m.delete_edge("e1"));
        assert!(!m.delete_edge("e1"));
        assert!(m.get_state().edges.is_empty());
    }

    #[tokio::test]
    async fn test_edge_without_endpoints_rejected() {
        let (mut m, _) = manager("A");
        let err = m.add_edge(NewEdge::new("", "n2")).unwrap_err();
        assert!(err.is_invalid());
        assert_eq!(m.history_len(), 0);
    }

    #[tokio::test]
    async fn test_strict_edges() {
        let store = MemoryStore::new();
        let config = EngineConfig::default().with_strict_edges(true);
        let mut m = StateManager::with_config(ClientId::new("A"), store, config);
        m.add_node(NewNode::new().with_id("n1")).unwrap();

        assert!(m.add_edge(NewEdge::new("n1", "ghost")).unwrap_err().is_invalid());

        let (mut lenient, _) = manager("A");
        assert!(lenient.add_edge(NewEdge::new("n1", "ghost")).is_ok());
    }

    #[tokio::test]
    async fn test_viewport() {
        let (mut m, _) = manager("A");
        m.update_viewport(Viewport::new(10.0, 20.0, 2.0)).unwrap();
        assert_eq!(m.get_state().viewport.zoom, 2.0);
        assert_eq!(vector_of(&m, "A"), 2);

        assert!(m.update_viewport(Viewport::new(0.0, 0.0, -1.0)).is_err());
        assert_eq!(vector_of(&m, "A"), 2);
    }

    #[tokio::test]
    async fn test_history_bound() {
        let store = MemoryStore::new();
        let config = EngineConfig::default().with_history_limit(2);
        let mut m = StateManager::with_config(ClientId::new("A"), store, config);
        for i in 0..5 {
            m.add_node(NewNode::new().with_id(format!("n{}", i))).unwrap();
        }
        assert_eq!(m.history_len(), 2);
        assert!(m.undo());
        assert!(m.undo());
        assert!(!m.undo());
        assert_eq!(m.get_state().nodes.len(), 3);
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let (mut m, store) = manager("A");
        m.add_node(NewNode::new().with_id("n1")).unwrap();
        m.flush().await.unwrap();

        assert_eq!(m.persistence_status(), PersistenceStatus::Persisted);
        assert_eq!(store.get("flow-state").as_ref(), Some(m.get_state()));
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_mutation() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let config = EngineConfig::default().with_retries(0, 1);
        let mut m = StateManager::with_config(ClientId::new("A"), store.clone(), config);

        m.add_node(NewNode::new().with_id("n1")).unwrap();
        assert!(m.flush().await.is_err());
        assert_eq!(m.persistence_status(), PersistenceStatus::Dirty);
        assert!(m.last_persistence_error().is_some());
        assert!(m.get_state().contains_node("n1"));

        store.set_failing(false);
        m.add_node(NewNode::new().with_id("n2")).unwrap();
        m.flush().await.unwrap();
        let saved = store.get("flow-state").unwrap();
        assert!(saved.contains_node("n1") && saved.contains_node("n2"));
        assert!(m.last_persistence_error().is_none());
    }

    #[tokio::test]
    async fn test_load_initializes_placeholder() {
        let (mut m, store) = manager("A");
        assert_eq!(m.load_state().await.unwrap(), LoadOutcome::Initialized);
        assert_eq!(m.get_state().nodes.len(), 1);
        assert_eq!(m.get_state().nodes[0].id, PLACEHOLDER_NODE_ID);
        assert_eq!(store.get("flow-state").as_ref(), Some(m.get_state()));
    }

    #[tokio::test]
    async fn test_load_restores_and_clears_history() {
        let (mut m, store) = manager("A");
        m.add_node(NewNode::new().with_id("n1")).unwrap();
        m.flush().await.unwrap();
        assert!(m.can_undo());

        assert_eq!(m.load_state().await.unwrap(), LoadOutcome::Restored);
        assert!(m.get_state().contains_node("n1"));
        assert!(!m.can_undo());

        let mut other = StateManager::new(ClientId::new("B"), store.clone());
        assert_eq!(other.load_state().await.unwrap(), LoadOutcome::Restored);
        assert_eq!(other.get_state(), m.get_state());
    }

    #[tokio::test]
    async fn test_load_waits_for_queued_saves() {
        let (mut m, store) = manager("A");
        m.load_state().await.unwrap();
        m.add_node(NewNode::new().with_id("n1")).unwrap();

        // No flush: the save for n1 may still be queued.
        assert_eq!(m.load_state().await.unwrap(), LoadOutcome::Restored);
        assert!(m.get_state().contains_node("n1"));

        m.flush().await.unwrap();
        assert_eq!(m.persistence_status(), PersistenceStatus::Persisted);
        assert_eq!(store.get("flow-state").as_ref(), Some(m.get_state()));
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_state() {
        let store = MemoryStore::new();
        let client = ClientId::new("A");
        let mut bad = GraphState::new(&client);
        let node = NewNode::new().with_id("n1").into_node(&client).unwrap();
        bad.nodes.push(node.clone());
        bad.nodes.push(node);
        store.insert("flow-state", bad);

        let mut m = StateManager::new(client, store);
        assert!(m.load_state().await.unwrap_err().is_invalid());
        assert!(m.get_state().nodes.is_empty());
    }

    fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
        (1usize..6).prop_flat_map(|n| {
            let edges = prop::collection::vec((0..n, 0..n), 0..12);
            (Just(n), edges)
        })
    }

    proptest! {
        #[test]
        fn prop_delete_node_leaves_no_dangling_edges(
            (n, edges) in arb_graph(),
            victim in 0usize..6,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            rt.block_on(async {
                let (mut m, _) = manager("A");
                for i in 0..n {
                    m.add_node(NewNode::new().with_id(format!("n{}", i))).unwrap();
                }
                for (i, (source, target)) in edges.iter().enumerate() {
                    let edge = NewEdge::new(format!("n{}", source), format!("n{}", target))
                        .with_id(format!("e{}", i));
                    m.add_edge(edge).unwrap();
                }

                let id = format!("n{}", victim);
                let existed = m.get_state().contains_node(&id);
                let untouched = edges.iter().filter(|&&(s, t)| s != victim && t != victim).count();

                prop_assert_eq!(m.delete_node(&id), existed);
                let state = m.get_state();
                prop_assert!(state.edges_touching(&id).next().is_none());
                prop_assert!(state.dangling_edges().next().is_none());
                prop_assert_eq!(state.edges.len(), untouched);
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
