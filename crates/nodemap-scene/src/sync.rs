#![forbid(unsafe_code)]

//! Scene synchronization engine.
//!
//! [`SceneSyncEngine`] keeps an [`EntityRegistry`] and a
//! [`PresentationSurface`] in agreement with a [`GraphStore`]. It diffs the
//! store's collections against the registry and issues the minimal set of
//! create, update and remove calls, routes gestures into position and
//! selection changes, and reacts to the store's change feed.
//!
//! # Invariants
//!
//! 1. After a full reconcile, the registry holds exactly one node entity per
//!    store node and one connector per connection whose endpoints exist and
//!    do not coincide.
//! 2. Reconciling the same input twice issues no surface calls the second
//!    time.
//! 3. Surface writes happen only when the rendered state actually changes
//!    (positions within `position_epsilon` count as unchanged).
//! 4. Selection never names a node without an entity after a reconcile.
//!
//! # Failure Modes
//!
//! Missing ids are benign transients: the registry and the store can be
//! observed between a mutation and its notification. Such steps are skipped
//! and logged at `trace`; the next sync converges.

use std::collections::{HashMap, HashSet};
use std::ops::AddAssign;

use bitflags::bitflags;
use nodemap_core::Vec3;
use nodemap_core::event::GestureEvent;
use nodemap_core::geometry::{Transform, connector_geometry};
use nodemap_core::id::{ConnectionId, NodeId};
use nodemap_graph::{ChangeFeed, Connection, GraphChange, GraphStore, Node};
use tracing::{debug, trace};

use crate::appearance::NodeAppearance;
use crate::config::SceneConfig;
use crate::drag::{DragPhase, DragSession};
use crate::registry::{ConnectorEntry, EntityRegistry, NodeEntry};
use crate::selection::{SelectionController, SelectionEffect};
use crate::surface::PresentationSurface;

/// Counts of surface operations issued by one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// Records skipped as transient (missing endpoint, degenerate geometry).
    pub skipped: usize,
}

impl ReconcileReport {
    /// Whether the pass issued no surface calls.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.removed == 0
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Removed => self.removed += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Unchanged => {}
        }
    }
}

impl AddAssign for ReconcileReport {
    fn add_assign(&mut self, rhs: Self) {
        self.created += rhs.created;
        self.updated += rhs.updated;
        self.removed += rhs.removed;
        self.skipped += rhs.skipped;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
    Removed,
    Skipped,
    Unchanged,
}

bitflags! {
    /// Which passes a batch of changes requires.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SyncScope: u8 {
        /// Full node pass.
        const NODES = 0b0001;
        /// Full connection pass.
        const CONNECTIONS = 0b0010;
        /// Position updates for specific nodes.
        const MOVES = 0b0100;
        /// Appearance refresh for specific nodes.
        const EDITS = 0b1000;
    }
}

impl SyncScope {
    /// Scope implied by one change.
    #[must_use]
    pub fn for_change(change: &GraphChange) -> Self {
        match change {
            GraphChange::NodeAdded(_) | GraphChange::NodeRemoved(_) | GraphChange::Reloaded => {
                Self::NODES | Self::CONNECTIONS
            }
            GraphChange::NodeMoved(_) => Self::MOVES,
            GraphChange::NodeEdited(_) => Self::EDITS,
            GraphChange::ConnectionAdded(_) | GraphChange::ConnectionRemoved(_) => {
                Self::CONNECTIONS
            }
        }
    }
}

/// Live synchronization between a graph store and a presentation surface.
pub struct SceneSyncEngine<S: PresentationSurface> {
    surface: S,
    registry: EntityRegistry,
    selection: SelectionController,
    drag: Option<DragSession>,
    feed: Option<ChangeFeed>,
    config: SceneConfig,
}

impl<S: PresentationSurface> SceneSyncEngine<S> {
    /// Create an engine with default configuration.
    pub fn new(surface: S) -> Self {
        Self::with_config(surface, SceneConfig::default())
    }

    pub fn with_config(surface: S, config: SceneConfig) -> Self {
        Self {
            surface,
            registry: EntityRegistry::new(),
            selection: SelectionController::new(),
            drag: None,
            feed: None,
            config,
        }
    }

    /// Subscribe to `store` and render its current contents.
    pub fn attach(&mut self, store: &mut GraphStore) -> ReconcileReport {
        self.feed = Some(store.subscribe());
        self.reconcile(store)
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The active drag, if any.
    #[must_use]
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    // ── Reconciliation ──────────────────────────────────────────────────

    /// Full node and connection pass against `store`.
    pub fn reconcile(&mut self, store: &GraphStore) -> ReconcileReport {
        let mut report = self.reconcile_nodes(store.nodes());
        report += self.reconcile_connections(store.connections(), store.nodes());
        report
    }

    /// Bring node entities in line with `nodes`.
    pub fn reconcile_nodes(&mut self, nodes: &[Node]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let present: HashSet<&NodeId> = nodes.iter().map(Node::id).collect();
        let mut stale: Vec<NodeId> = self
            .registry
            .node_ids()
            .filter(|id| !present.contains(id))
            .cloned()
            .collect();
        stale.sort();
        for id in stale {
            self.remove_node_entity(&id);
            report.record(Outcome::Removed);
        }

        for node in nodes {
            let outcome = if self.registry.node(node.id()).is_some() {
                self.refresh_node(node)
            } else {
                self.create_node(node)
            };
            report.record(outcome);
        }

        if !report.is_noop() {
            debug!(
                created = report.created,
                updated = report.updated,
                removed = report.removed,
                "reconciled nodes"
            );
        }
        report
    }

    /// Bring connector entities in line with `connections`.
    pub fn reconcile_connections(
        &mut self,
        connections: &[Connection],
        nodes: &[Node],
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let present: HashSet<&ConnectionId> = connections.iter().map(Connection::id).collect();
        let mut stale: Vec<ConnectionId> = self
            .registry
            .connector_ids()
            .filter(|id| !present.contains(id))
            .cloned()
            .collect();
        stale.sort();
        for id in stale {
            if let Some(entry) = self.registry.remove_connector(&id) {
                self.surface.remove_entity(entry.handle);
                report.record(Outcome::Removed);
            }
        }

        let lookup = index_nodes(nodes);
        for connection in connections {
            report.record(self.reconcile_connector(connection, &lookup));
        }

        if !report.is_noop() {
            debug!(
                created = report.created,
                updated = report.updated,
                removed = report.removed,
                skipped = report.skipped,
                "reconciled connections"
            );
        }
        report
    }

    /// Recompute only the connectors touching `node`.
    pub fn reconcile_connections_touching(
        &mut self,
        node: &NodeId,
        connections: &[Connection],
        nodes: &[Node],
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let lookup = index_nodes(nodes);
        for connection in connections.iter().filter(|c| c.touches(node)) {
            report.record(self.reconcile_connector(connection, &lookup));
        }
        report
    }

    fn create_node(&mut self, node: &Node) -> Outcome {
        if !node.position.is_finite() {
            trace!(id = %node.id(), "skipping node with non-finite position");
            return Outcome::Skipped;
        }
        let selected = self.selection.is_selected(node.id());
        let appearance = NodeAppearance::for_node(node, selected, &self.config);
        let transform = Transform::at(node.position, appearance.scale);
        let handle = self
            .surface
            .create_node_entity(node, &appearance, transform);
        self.registry.insert_node(
            node.id().clone(),
            NodeEntry::new(handle, node.position, appearance),
        );
        Outcome::Created
    }

    /// Update a registered node's position and appearance where they differ.
    fn refresh_node(&mut self, node: &Node) -> Outcome {
        let selected = self.selection.is_selected(node.id());
        let appearance = NodeAppearance::for_node(node, selected, &self.config);
        let dragging = self.is_dragging(node.id());
        let epsilon = self.config.position_epsilon;
        let drag_scale = self.config.drag_scale;

        let Some(entry) = self.registry.node_mut(node.id()) else {
            return Outcome::Skipped;
        };
        let moved = node.position.is_finite()
            && entry.rendered_position.distance(node.position) > epsilon;
        let restyled = entry.appearance != appearance;
        if !moved && !restyled {
            return Outcome::Unchanged;
        }

        let rescaled = !dragging && entry.appearance.scale != appearance.scale;
        if restyled {
            self.surface.set_entity_appearance(entry.handle, &appearance);
            entry.appearance = appearance;
        }
        if moved {
            entry.rendered_position = node.position;
        }
        if moved || rescaled {
            let scale = if dragging {
                drag_scale
            } else {
                entry.appearance.scale
            };
            self.surface
                .update_entity_transform(entry.handle, Transform::at(entry.rendered_position, scale));
        }
        Outcome::Updated
    }

    fn remove_node_entity(&mut self, id: &NodeId) {
        if let Some(entry) = self.registry.remove_node(id) {
            self.surface.remove_entity(entry.handle);
        }
        if self.selection.node_removed(id) {
            debug!(%id, "selected node removed, selection cleared");
        }
        if self.is_dragging(id) {
            debug!(%id, "dragged node removed, drag dropped");
            self.drag = None;
        }
    }

    fn reconcile_connector(
        &mut self,
        connection: &Connection,
        lookup: &HashMap<&NodeId, &Node>,
    ) -> Outcome {
        let id = connection.id();
        let endpoints = lookup
            .get(&connection.from)
            .zip(lookup.get(&connection.to));
        let geometry = match endpoints {
            Some((from, to)) => connector_geometry(from.position, to.position),
            None => {
                trace!(%id, "connector endpoint missing, skipping");
                None
            }
        };

        let Some(geometry) = geometry else {
            if let Some(entry) = self.registry.remove_connector(id) {
                self.surface.remove_entity(entry.handle);
                trace!(%id, "connector removed until it resolves again");
                return Outcome::Removed;
            }
            return Outcome::Skipped;
        };

        let transform = geometry.transform(self.config.connector_radius);
        match self.registry.connector_mut(id) {
            Some(entry) => {
                if entry
                    .geometry
                    .approx_eq(&geometry, self.config.position_epsilon)
                {
                    return Outcome::Unchanged;
                }
                entry.geometry = geometry;
                self.surface.update_entity_transform(entry.handle, transform);
                Outcome::Updated
            }
            None => {
                let handle = self
                    .surface
                    .create_connector_entity(connection, transform);
                self.registry
                    .insert_connector(id.clone(), ConnectorEntry { handle, geometry });
                Outcome::Created
            }
        }
    }

    // ── Gestures ────────────────────────────────────────────────────────

    fn is_dragging(&self, id: &NodeId) -> bool {
        self.drag.as_ref().is_some_and(|d| d.node() == id)
    }

    /// Route one phase of a drag on `node_id`.
    pub fn apply_drag(&mut self, store: &mut GraphStore, node_id: &NodeId, phase: DragPhase) {
        match phase {
            DragPhase::Started => self.begin_drag(node_id),
            DragPhase::Changed(translation) => {
                if self.drag.is_none() {
                    self.begin_drag(node_id);
                }
                self.continue_drag(store, node_id, translation);
            }
            DragPhase::Ended => self.end_drag(store, node_id),
        }
    }

    fn begin_drag(&mut self, node_id: &NodeId) {
        if let Some(active) = &self.drag {
            trace!(%node_id, active = %active.node(), "drag already in progress, ignoring start");
            return;
        }
        let Some(entry) = self.registry.node(node_id) else {
            trace!(%node_id, "drag start on unregistered node");
            return;
        };
        let captured = entry.rendered_position;
        self.surface.update_entity_transform(
            entry.handle,
            Transform::at(captured, self.config.drag_scale),
        );
        self.drag = Some(DragSession::begin(node_id.clone(), captured));
        debug!(%node_id, ?captured, "drag started");
    }

    fn continue_drag(&mut self, store: &mut GraphStore, node_id: &NodeId, translation: Vec3) {
        let bounds = self.config.bounds;
        let Some(session) = self.drag.as_mut().filter(|d| d.node() == node_id) else {
            trace!(%node_id, "drag update outside its session, ignoring");
            return;
        };
        let Some(target) = session.advance(translation, &bounds) else {
            trace!(%node_id, ?translation, "non-finite drag translation, ignoring");
            return;
        };
        let Some(entry) = self.registry.node_mut(node_id) else {
            self.drag = None;
            return;
        };

        entry.rendered_position = target;
        self.surface.update_entity_transform(
            entry.handle,
            Transform::at(target, self.config.drag_scale),
        );
        store.update_position(node_id, target);
        self.reconcile_connections_touching(node_id, store.connections(), store.nodes());
    }

    fn end_drag(&mut self, store: &GraphStore, node_id: &NodeId) {
        if !self.is_dragging(node_id) {
            trace!(%node_id, "drag end outside its session, ignoring");
            return;
        }
        let session = self.drag.take();
        if let Some(entry) = self.registry.node(node_id) {
            self.surface.update_entity_transform(
                entry.handle,
                Transform::at(entry.rendered_position, entry.appearance.scale),
            );
        }
        self.reconcile_connections_touching(node_id, store.connections(), store.nodes());
        debug!(
            %node_id,
            target = ?session.map(|s| s.last_target()),
            "drag ended"
        );
    }

    /// Toggle selection of `node_id` and restyle the affected nodes.
    pub fn handle_tap(&mut self, store: &GraphStore, node_id: &NodeId) {
        if store.node(node_id).is_none() {
            trace!(%node_id, "tap on missing node");
            return;
        }
        for effect in self.selection.tap(node_id) {
            self.apply_selection_effect(store, &effect);
        }
    }

    fn apply_selection_effect(&mut self, store: &GraphStore, effect: &SelectionEffect) {
        let Some(node) = store.node(effect.node()) else {
            trace!(id = %effect.node(), "selection effect for missing node");
            return;
        };
        self.refresh_node(node);
    }

    /// Resolve a gesture's entity and route it to drag or tap handling.
    pub fn handle_gesture(&mut self, store: &mut GraphStore, event: GestureEvent) {
        let handle = event.handle();
        let Some(node_id) = self.registry.node_for_handle(handle).cloned() else {
            trace!(%handle, "gesture on non-node entity, ignoring");
            return;
        };
        match event {
            GestureEvent::DragStart { .. } => self.apply_drag(store, &node_id, DragPhase::Started),
            GestureEvent::DragUpdate { translation, .. } => {
                let world = self.config.gesture_space.to_world(translation);
                self.apply_drag(store, &node_id, DragPhase::Changed(world));
            }
            GestureEvent::DragEnd { .. } => self.apply_drag(store, &node_id, DragPhase::Ended),
            GestureEvent::Tap { .. } => self.handle_tap(store, &node_id),
        }
    }

    // ── Change feed ─────────────────────────────────────────────────────

    /// Drain pending store changes and run the passes they require.
    ///
    /// Without a feed (never attached) this is a full reconcile.
    pub fn sync(&mut self, store: &GraphStore) -> ReconcileReport {
        let Some(feed) = &self.feed else {
            return self.reconcile(store);
        };
        let changes = feed.drain();
        if changes.is_empty() {
            return ReconcileReport::default();
        }

        let mut scope = SyncScope::empty();
        let mut touched: Vec<NodeId> = Vec::new();
        for change in &changes {
            scope |= SyncScope::for_change(change);
            if let GraphChange::NodeMoved(id) | GraphChange::NodeEdited(id) = change {
                if !touched.contains(id) {
                    touched.push(id.clone());
                }
            }
        }
        trace!(changes = changes.len(), ?scope, "syncing");

        let mut report = ReconcileReport::default();
        if scope.contains(SyncScope::NODES) {
            report += self.reconcile_nodes(store.nodes());
        } else {
            for id in &touched {
                match store.node(id) {
                    Some(node) => report.record(self.refresh_node(node)),
                    None => trace!(%id, "changed node already gone"),
                }
            }
        }

        if scope.contains(SyncScope::CONNECTIONS) {
            report += self.reconcile_connections(store.connections(), store.nodes());
        } else if scope.contains(SyncScope::MOVES) {
            for id in &touched {
                report +=
                    self.reconcile_connections_touching(id, store.connections(), store.nodes());
            }
        }

        if let Some(selected) = self.selection.selected().cloned() {
            if store.node(&selected).is_none() {
                self.selection.node_removed(&selected);
            }
        }
        report
    }
}

impl<S: PresentationSurface + std::fmt::Debug> std::fmt::Debug for SceneSyncEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneSyncEngine")
            .field("surface", &self.surface)
            .field("nodes", &self.registry.node_count())
            .field("connectors", &self.registry.connector_count())
            .field("selection", self.selection.state())
            .field("drag", &self.drag)
            .field("attached", &self.feed.is_some())
            .finish()
    }
}

fn index_nodes(nodes: &[Node]) -> HashMap<&NodeId, &Node> {
    nodes.iter().map(|n| (n.id(), n)).collect()
}
