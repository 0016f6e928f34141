#![forbid(unsafe_code)]

//! Single owner of a graph store and its scene.
//!
//! `SceneSession` is the owner context every mutation and gesture runs on.
//! Each mutation is followed by a [`SceneSyncEngine::sync`] before it
//! returns, so the scene never trails the store by more than one call.

use nodemap_core::Vec3;
use nodemap_core::event::GestureEvent;
use nodemap_core::id::{ConnectionId, NodeId};
use nodemap_graph::GraphStore;

use crate::config::SceneConfig;
use crate::surface::PresentationSurface;
use crate::sync::{ReconcileReport, SceneSyncEngine};

/// A store, an engine attached to it, and the surface it drives.
pub struct SceneSession<S: PresentationSurface> {
    store: GraphStore,
    engine: SceneSyncEngine<S>,
}

impl<S: PresentationSurface> SceneSession<S> {
    /// Attach a new engine to `store` and render it onto `surface`.
    pub fn new(store: GraphStore, surface: S) -> Self {
        Self::with_config(store, surface, SceneConfig::default())
    }

    pub fn with_config(mut store: GraphStore, surface: S, config: SceneConfig) -> Self {
        let mut engine = SceneSyncEngine::with_config(surface, config);
        engine.attach(&mut store);
        Self { store, engine }
    }

    #[must_use]
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    #[must_use]
    pub fn engine(&self) -> &SceneSyncEngine<S> {
        &self.engine
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        self.engine.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.engine.surface_mut()
    }

    /// Tear the session apart.
    pub fn into_parts(self) -> (GraphStore, S) {
        (self.store, self.engine.into_surface())
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        detail: impl Into<String>,
        position: Option<Vec3>,
    ) -> NodeId {
        let id = self.store.add_node(name, detail, position);
        self.sync();
        id
    }

    pub fn remove_node(&mut self, id: &NodeId) {
        self.store.remove_node(id);
        self.sync();
    }

    pub fn update_node(&mut self, id: &NodeId, name: impl Into<String>, detail: impl Into<String>) {
        self.store.update_node(id, name, detail);
        self.sync();
    }

    pub fn update_position(&mut self, id: &NodeId, position: Vec3) {
        self.store.update_position(id, position);
        self.sync();
    }

    pub fn add_connection(&mut self, from: &NodeId, to: &NodeId) -> Option<ConnectionId> {
        let id = self.store.add_connection(from, to);
        self.sync();
        id
    }

    pub fn remove_connection(&mut self, id: &ConnectionId) {
        self.store.remove_connection(id);
        self.sync();
    }

    pub fn remove_connections_between(&mut self, a: &NodeId, b: &NodeId) -> usize {
        let removed = self.store.remove_connections_between(a, b);
        self.sync();
        removed
    }

    /// Route a gesture, then settle any store changes it caused.
    pub fn handle_gesture(&mut self, event: GestureEvent) {
        self.engine.handle_gesture(&mut self.store, event);
        self.sync();
    }

    /// Toggle selection of a node directly.
    pub fn tap(&mut self, id: &NodeId) {
        self.engine.handle_tap(&self.store, id);
    }

    /// Apply pending store changes to the scene.
    pub fn sync(&mut self) -> ReconcileReport {
        self.engine.sync(&self.store)
    }
}

impl<S: PresentationSurface + std::fmt::Debug> std::fmt::Debug for SceneSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneSession")
            .field("store", &self.store)
            .field("engine", &self.engine)
            .finish()
    }
}
