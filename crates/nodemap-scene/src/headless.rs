#![forbid(unsafe_code)]

//! Recording surface for tests and scripted sessions.
//!
//! `HeadlessSurface` implements [`PresentationSurface`] without rendering
//! anything. It logs every call in order and keeps a table of live
//! entities, so tests can assert both on what the engine asked for and on
//! the resulting scene.
//!
//! # Example
//!
//! ```
//! use nodemap_graph::GraphStore;
//! use nodemap_scene::headless::HeadlessSurface;
//! use nodemap_scene::sync::SceneSyncEngine;
//!
//! let mut store = GraphStore::sample();
//! let mut engine = SceneSyncEngine::new(HeadlessSurface::new());
//! engine.attach(&mut store);
//! assert_eq!(engine.surface().node_entity_count(), 5);
//! assert_eq!(engine.surface().connector_entity_count(), 1);
//! ```

use std::collections::BTreeMap;

use nodemap_core::event::EntityHandle;
use nodemap_core::geometry::Transform;
use nodemap_graph::{Connection, Node};

use crate::appearance::NodeAppearance;
use crate::registry::EntityTag;
use crate::surface::PresentationSurface;

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    CreateNode {
        handle: EntityHandle,
        tag: EntityTag,
        appearance: NodeAppearance,
        transform: Transform,
    },
    CreateConnector {
        handle: EntityHandle,
        tag: EntityTag,
        transform: Transform,
    },
    UpdateTransform {
        handle: EntityHandle,
        transform: Transform,
    },
    Remove {
        handle: EntityHandle,
    },
    SetAppearance {
        handle: EntityHandle,
        appearance: NodeAppearance,
    },
}

impl SurfaceCall {
    /// The entity the call targets.
    #[must_use]
    pub fn handle(&self) -> EntityHandle {
        match self {
            Self::CreateNode { handle, .. }
            | Self::CreateConnector { handle, .. }
            | Self::UpdateTransform { handle, .. }
            | Self::Remove { handle }
            | Self::SetAppearance { handle, .. } => *handle,
        }
    }

    /// Whether the call creates or removes an entity.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::CreateNode { .. } | Self::CreateConnector { .. } | Self::Remove { .. }
        )
    }
}

/// A live entity on the headless surface.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessEntity {
    pub tag: EntityTag,
    pub transform: Transform,
    /// Present for node entities only.
    pub appearance: Option<NodeAppearance>,
}

/// Surface that records calls instead of rendering.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    next_handle: u64,
    entities: BTreeMap<EntityHandle, HeadlessEntity>,
    calls: Vec<SurfaceCall>,
}

impl HeadlessSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call since creation or the last [`take_calls`](Self::take_calls).
    #[must_use]
    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    /// Drain the call log.
    pub fn take_calls(&mut self) -> Vec<SurfaceCall> {
        std::mem::take(&mut self.calls)
    }

    #[must_use]
    pub fn entity(&self, handle: EntityHandle) -> Option<&HeadlessEntity> {
        self.entities.get(&handle)
    }

    /// Live entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityHandle, &HeadlessEntity)> {
        self.entities.iter().map(|(h, e)| (*h, e))
    }

    #[must_use]
    pub fn node_entity_count(&self) -> usize {
        self.entities
            .values()
            .filter(|e| matches!(e.tag, EntityTag::Node(_)))
            .count()
    }

    #[must_use]
    pub fn connector_entity_count(&self) -> usize {
        self.entities
            .values()
            .filter(|e| matches!(e.tag, EntityTag::Connection(_)))
            .count()
    }

    fn allocate(&mut self) -> EntityHandle {
        self.next_handle += 1;
        EntityHandle::from_raw(self.next_handle)
    }
}

impl PresentationSurface for HeadlessSurface {
    fn create_node_entity(
        &mut self,
        node: &Node,
        appearance: &NodeAppearance,
        transform: Transform,
    ) -> EntityHandle {
        let handle = self.allocate();
        let tag = EntityTag::Node(node.id().clone());
        self.entities.insert(
            handle,
            HeadlessEntity {
                tag: tag.clone(),
                transform,
                appearance: Some(appearance.clone()),
            },
        );
        self.calls.push(SurfaceCall::CreateNode {
            handle,
            tag,
            appearance: appearance.clone(),
            transform,
        });
        handle
    }

    fn create_connector_entity(
        &mut self,
        connection: &Connection,
        transform: Transform,
    ) -> EntityHandle {
        let handle = self.allocate();
        let tag = EntityTag::Connection(connection.id().clone());
        self.entities.insert(
            handle,
            HeadlessEntity {
                tag: tag.clone(),
                transform,
                appearance: None,
            },
        );
        self.calls.push(SurfaceCall::CreateConnector {
            handle,
            tag,
            transform,
        });
        handle
    }

    fn update_entity_transform(&mut self, handle: EntityHandle, transform: Transform) {
        if let Some(entity) = self.entities.get_mut(&handle) {
            entity.transform = transform;
        }
        self.calls
            .push(SurfaceCall::UpdateTransform { handle, transform });
    }

    fn remove_entity(&mut self, handle: EntityHandle) {
        self.entities.remove(&handle);
        self.calls.push(SurfaceCall::Remove { handle });
    }

    fn set_entity_appearance(&mut self, handle: EntityHandle, appearance: &NodeAppearance) {
        if let Some(entity) = self.entities.get_mut(&handle) {
            entity.appearance = Some(appearance.clone());
        }
        self.calls.push(SurfaceCall::SetAppearance {
            handle,
            appearance: appearance.clone(),
        });
    }
}
