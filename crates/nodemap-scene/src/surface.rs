#![forbid(unsafe_code)]

//! Presentation surface contract.
//!
//! The scene engine drives a surface through exactly five primitives and
//! never depends on the rendering technology behind it. Handles are
//! assigned by the surface and are opaque to the engine.
//!
//! # Invariants
//!
//! 1. A handle returned by a `create_*` call stays valid until it is passed
//!    to [`remove_entity`](PresentationSurface::remove_entity).
//! 2. Calls with an unknown handle are ignored by the surface.

use nodemap_core::event::EntityHandle;
use nodemap_core::geometry::Transform;
use nodemap_graph::{Connection, Node};

use crate::appearance::NodeAppearance;

/// A rendering backend the scene engine writes to.
pub trait PresentationSurface {
    /// Create a node entity tagged with `node`'s id.
    fn create_node_entity(
        &mut self,
        node: &Node,
        appearance: &NodeAppearance,
        transform: Transform,
    ) -> EntityHandle;

    /// Create a connector entity tagged with `connection`'s id.
    ///
    /// `transform` places a unit cylinder along the reference axis.
    fn create_connector_entity(&mut self, connection: &Connection, transform: Transform)
    -> EntityHandle;

    /// Move, rotate or rescale an entity.
    fn update_entity_transform(&mut self, handle: EntityHandle, transform: Transform);

    /// Destroy an entity.
    fn remove_entity(&mut self, handle: EntityHandle);

    /// Replace a node entity's label and material.
    fn set_entity_appearance(&mut self, handle: EntityHandle, appearance: &NodeAppearance);
}

impl<S: PresentationSurface + ?Sized> PresentationSurface for Box<S> {
    fn create_node_entity(
        &mut self,
        node: &Node,
        appearance: &NodeAppearance,
        transform: Transform,
    ) -> EntityHandle {
        (**self).create_node_entity(node, appearance, transform)
    }

    fn create_connector_entity(
        &mut self,
        connection: &Connection,
        transform: Transform,
    ) -> EntityHandle {
        (**self).create_connector_entity(connection, transform)
    }

    fn update_entity_transform(&mut self, handle: EntityHandle, transform: Transform) {
        (**self).update_entity_transform(handle, transform);
    }

    fn remove_entity(&mut self, handle: EntityHandle) {
        (**self).remove_entity(handle);
    }

    fn set_entity_appearance(&mut self, handle: EntityHandle, appearance: &NodeAppearance) {
        (**self).set_entity_appearance(handle, appearance);
    }
}
