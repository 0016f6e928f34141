#![forbid(unsafe_code)]

//! The canonical graph: nodes, connections, and their invariants.
//!
//! [`GraphStore`] is the single source of truth. Mutations go through its
//! methods only; each successful mutation is announced on every
//! [`ChangeFeed`] and written through to the optional persistence backend.
//!
//! # Invariants
//!
//! 1. Every connection references two nodes present in the store.
//! 2. No connection joins a node to itself.
//! 3. At most one connection exists per unordered pair of nodes.
//! 4. Every node position is finite.
//!
//! Calls that would break an invariant are silent no-ops. Callers are
//! expected to pre-validate (see [`GraphStore::link_candidates`]).

use nodemap_core::{DVec3, Vec3};
use nodemap_core::id::{ConnectionId, NodeId};
use tracing::{debug, trace, warn};

use crate::change::{ChangeFeed, GraphChange, Subscribers};
use crate::model::{Connection, Node};
use crate::persistence::{PersistenceBackend, PersistenceError};
use crate::snapshot::{GraphSnapshot, Record, RecordKey};

/// Write-through behavior of a store with a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Re-read the backend after every successful write and adopt its
    /// contents when they differ from memory.
    pub read_after_write: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            read_after_write: true,
        }
    }
}

impl PersistenceConfig {
    /// Toggle read-after-write.
    #[must_use]
    pub fn with_read_after_write(mut self, enabled: bool) -> Self {
        self.read_after_write = enabled;
        self
    }
}

/// A pending write to the backend.
enum StorageOp {
    Save(RecordKey),
    Delete(RecordKey),
}

/// Owner of the node and connection collections.
pub struct GraphStore {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    subscribers: Subscribers,
    backend: Option<Box<dyn PersistenceBackend>>,
    config: PersistenceConfig,
    last_persistence_error: Option<PersistenceError>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    /// Create an empty, memory-only store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            subscribers: Subscribers::default(),
            backend: None,
            config: PersistenceConfig::default(),
            last_persistence_error: None,
        }
    }

    /// Create a memory-only store from existing collections.
    ///
    /// Records that would break an invariant are dropped with a warning.
    #[must_use]
    pub fn with_nodes_and_connections(nodes: Vec<Node>, connections: Vec<Connection>) -> Self {
        let mut store = Self::new();
        store.adopt(sanitize(GraphSnapshot::new(nodes, connections)));
        store
    }

    /// Create a memory-only store holding the sample graph.
    #[must_use]
    pub fn sample() -> Self {
        let snapshot = GraphSnapshot::sample();
        Self::with_nodes_and_connections(snapshot.nodes, snapshot.connections)
    }

    /// Create a store backed by `backend`, loading its current contents.
    ///
    /// A failed load starts the store empty and records the error.
    #[must_use]
    pub fn with_backend(backend: impl PersistenceBackend + 'static) -> Self {
        let mut store = Self::new();
        match backend.load_all() {
            Ok(snapshot) => {
                store.adopt(sanitize(snapshot));
                debug!(
                    backend = backend.name(),
                    nodes = store.nodes.len(),
                    connections = store.connections.len(),
                    "loaded graph"
                );
            }
            Err(err) => {
                warn!(backend = backend.name(), error = %err, "failed to load graph, starting empty");
                store.last_persistence_error = Some(err);
            }
        }
        store.backend = Some(Box::new(backend));
        store
    }

    /// Set the write-through configuration.
    #[must_use]
    pub fn with_persistence_config(mut self, config: PersistenceConfig) -> Self {
        self.config = config;
        self
    }

    /// Open a change feed that receives every subsequent mutation.
    pub fn subscribe(&mut self) -> ChangeFeed {
        self.subscribers.subscribe()
    }

    /// Name of the attached backend, if any.
    #[must_use]
    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.name())
    }

    /// The most recent persistence failure, if any.
    #[must_use]
    pub fn last_persistence_error(&self) -> Option<&PersistenceError> {
        self.last_persistence_error.as_ref()
    }

    /// Take and clear the most recent persistence failure.
    pub fn take_persistence_error(&mut self) -> Option<PersistenceError> {
        self.last_persistence_error.take()
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// All nodes in insertion order.
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All connections in insertion order.
    #[inline]
    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    #[must_use]
    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id() == id)
    }

    /// Nodes at the other end of every connection touching `id`.
    #[must_use]
    pub fn nodes_connected_to(&self, id: &NodeId) -> Vec<&Node> {
        self.connections
            .iter()
            .filter_map(|c| c.other_end(id))
            .filter_map(|other| self.node(other))
            .collect()
    }

    /// Whether `id` has at least one connection.
    #[must_use]
    pub fn has_connection(&self, id: &NodeId) -> bool {
        self.connections.iter().any(|c| c.touches(id))
    }

    /// Whether a connection joins `a` and `b` in either direction.
    #[must_use]
    pub fn are_connected(&self, a: &NodeId, b: &NodeId) -> bool {
        self.connections.iter().any(|c| c.joins(a, b))
    }

    /// Nodes that `add_connection(id, _)` would accept, in insertion order.
    #[must_use]
    pub fn link_candidates(&self, id: &NodeId) -> Vec<&Node> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        self.nodes
            .iter()
            .filter(|n| n.id() != id && !self.are_connected(id, n.id()))
            .collect()
    }

    /// Component-wise mean of all node positions, or the origin when empty.
    #[must_use]
    pub fn centroid(&self) -> Vec3 {
        if self.nodes.is_empty() {
            return Vec3::ZERO;
        }
        // f64 sum so large finite coordinates cannot overflow.
        let sum: DVec3 = self.nodes.iter().map(|n| n.position.as_dvec3()).sum();
        let mean = (sum / self.nodes.len() as f64).as_vec3();
        if mean.is_finite() {
            mean
        } else {
            Vec3::ZERO
        }
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::new(self.nodes.clone(), self.connections.clone())
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Add a node at `position`, or at the centroid when `None`.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        detail: impl Into<String>,
        position: Option<Vec3>,
    ) -> NodeId {
        let position = match position {
            Some(p) if p.is_finite() => p,
            Some(p) => {
                warn!(?p, "non-finite node position, placing at centroid");
                self.centroid()
            }
            None => self.centroid(),
        };
        let id = NodeId::generate();
        self.nodes.push(Node::new(id.clone(), name, detail, position));
        debug!(%id, ?position, "node added");

        self.subscribers.notify(GraphChange::NodeAdded(id.clone()));
        self.write_through(&[StorageOp::Save(RecordKey::Node(id.clone()))]);
        id
    }

    /// Remove a node and every connection touching it.
    pub fn remove_node(&mut self, id: &NodeId) {
        let Some(index) = self.nodes.iter().position(|n| n.id() == id) else {
            trace!(%id, "remove_node: no such node");
            return;
        };
        self.nodes.remove(index);

        let mut removed = Vec::new();
        self.connections.retain(|c| {
            if c.touches(id) {
                removed.push(c.id().clone());
                false
            } else {
                true
            }
        });
        debug!(%id, cascaded = removed.len(), "node removed");

        let mut ops = Vec::with_capacity(removed.len() + 1);
        for conn in removed {
            self.subscribers
                .notify(GraphChange::ConnectionRemoved(conn.clone()));
            ops.push(StorageOp::Delete(RecordKey::Connection(conn)));
        }
        self.subscribers.notify(GraphChange::NodeRemoved(id.clone()));
        ops.push(StorageOp::Delete(RecordKey::Node(id.clone())));
        self.write_through(&ops);
    }

    /// Replace a node's position. No-op when absent, unchanged, or non-finite.
    pub fn update_position(&mut self, id: &NodeId, position: Vec3) {
        if !position.is_finite() {
            warn!(%id, ?position, "ignoring non-finite position");
            return;
        }
        let Some(node) = self.nodes.iter_mut().find(|n| n.id() == id) else {
            trace!(%id, "update_position: no such node");
            return;
        };
        if node.position == position {
            return;
        }
        node.position = position;
        trace!(%id, ?position, "node moved");

        self.subscribers.notify(GraphChange::NodeMoved(id.clone()));
        self.write_through(&[StorageOp::Save(RecordKey::Node(id.clone()))]);
    }

    /// Replace a node's name and detail. No-op when absent or unchanged.
    pub fn update_node(
        &mut self,
        id: &NodeId,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id() == id) else {
            trace!(%id, "update_node: no such node");
            return;
        };
        let (name, detail) = (name.into(), detail.into());
        if node.name == name && node.detail == detail {
            return;
        }
        node.name = name;
        node.detail = detail;
        debug!(%id, "node edited");

        self.subscribers.notify(GraphChange::NodeEdited(id.clone()));
        self.write_through(&[StorageOp::Save(RecordKey::Node(id.clone()))]);
    }

    /// Connect two distinct, existing, not-yet-connected nodes.
    pub fn add_connection(&mut self, from: &NodeId, to: &NodeId) -> Option<ConnectionId> {
        if from == to {
            trace!(%from, "add_connection: self loop rejected");
            return None;
        }
        if self.node(from).is_none() || self.node(to).is_none() {
            trace!(%from, %to, "add_connection: missing endpoint");
            return None;
        }
        if self.are_connected(from, to) {
            trace!(%from, %to, "add_connection: duplicate rejected");
            return None;
        }

        let id = ConnectionId::generate();
        self.connections
            .push(Connection::new(id.clone(), from.clone(), to.clone()));
        debug!(%id, %from, %to, "connection added");

        self.subscribers
            .notify(GraphChange::ConnectionAdded(id.clone()));
        self.write_through(&[StorageOp::Save(RecordKey::Connection(id.clone()))]);
        Some(id)
    }

    /// Remove a connection by id. No-op when absent.
    pub fn remove_connection(&mut self, id: &ConnectionId) {
        let Some(index) = self.connections.iter().position(|c| c.id() == id) else {
            trace!(%id, "remove_connection: no such connection");
            return;
        };
        self.connections.remove(index);
        debug!(%id, "connection removed");

        self.subscribers
            .notify(GraphChange::ConnectionRemoved(id.clone()));
        self.write_through(&[StorageOp::Delete(RecordKey::Connection(id.clone()))]);
    }

    /// Remove every connection joining `a` and `b`. Returns how many were removed.
    pub fn remove_connections_between(&mut self, a: &NodeId, b: &NodeId) -> usize {
        let ids: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|c| c.joins(a, b))
            .map(|c| c.id().clone())
            .collect();
        for id in &ids {
            self.remove_connection(id);
        }
        ids.len()
    }

    // ── Persistence ─────────────────────────────────────────────────────

    fn record(&self, key: &RecordKey) -> Option<Record<'_>> {
        match key {
            RecordKey::Node(id) => self.node(id).map(Record::Node),
            RecordKey::Connection(id) => self.connection(id).map(Record::Connection),
        }
    }

    fn write_through(&mut self, ops: &[StorageOp]) {
        let Some(backend) = self.backend.as_deref() else {
            return;
        };

        let mut failure = None;
        for op in ops {
            let result = match op {
                StorageOp::Save(key) => match self.record(key) {
                    Some(record) => backend.save(record),
                    None => Ok(()),
                },
                StorageOp::Delete(key) => backend.delete(key),
            };
            if let Err(err) = result {
                warn!(
                    backend = backend.name(),
                    error = %err,
                    "persistence write failed, keeping in-memory state"
                );
                failure = Some(err);
                break;
            }
        }

        match failure {
            Some(err) => self.last_persistence_error = Some(err),
            None if self.config.read_after_write => self.refresh_from_backend(),
            None => {}
        }
    }

    /// Re-read the backend and adopt its contents when they differ.
    fn refresh_from_backend(&mut self) {
        let Some(backend) = self.backend.as_deref() else {
            return;
        };
        let snapshot = match backend.load_all() {
            Ok(snapshot) => sanitize(snapshot),
            Err(err) => {
                warn!(backend = backend.name(), error = %err, "read-after-write failed");
                self.last_persistence_error = Some(err);
                return;
            }
        };
        if snapshot.nodes == self.nodes && snapshot.connections == self.connections {
            return;
        }
        debug!(
            backend = backend.name(),
            nodes = snapshot.nodes.len(),
            connections = snapshot.connections.len(),
            "adopting backend state"
        );
        self.adopt(snapshot);
        self.subscribers.notify(GraphChange::Reloaded);
    }

    fn adopt(&mut self, snapshot: GraphSnapshot) {
        self.nodes = snapshot.nodes;
        self.connections = snapshot.connections;
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections.len())
            .field("subscribers", &self.subscribers.len())
            .field("backend", &self.backend_name())
            .finish()
    }
}

/// Drop records that would break a store invariant.
fn sanitize(snapshot: GraphSnapshot) -> GraphSnapshot {
    let mut nodes: Vec<Node> = Vec::with_capacity(snapshot.nodes.len());
    for node in snapshot.nodes {
        if !node.position.is_finite() {
            warn!(id = %node.id(), "dropping node with non-finite position");
        } else if nodes.iter().any(|n| n.id() == node.id()) {
            warn!(id = %node.id(), "dropping duplicate node id");
        } else {
            nodes.push(node);
        }
    }

    let mut connections: Vec<Connection> = Vec::with_capacity(snapshot.connections.len());
    for conn in snapshot.connections {
        let endpoints_exist = nodes.iter().any(|n| *n.id() == conn.from)
            && nodes.iter().any(|n| *n.id() == conn.to);
        let valid = conn.from != conn.to
            && endpoints_exist
            && !connections
                .iter()
                .any(|c| c.id() == conn.id() || c.joins(&conn.from, &conn.to));
        if valid {
            connections.push(conn);
        } else {
            warn!(id = %conn.id(), "dropping invalid connection");
        }
    }

    GraphSnapshot::new(nodes, connections)
}
