#![forbid(unsafe_code)]

//! Bidirectional table between domain ids and entity handles.
//!
//! The registry is a cache of what the surface currently shows. It is
//! never a source of truth: every entry can be rebuilt from the store.
//!
//! # Usage
//!
//! ```
//! use nodemap_core::Vec3;
//! use nodemap_core::event::EntityHandle;
//! use nodemap_core::id::NodeId;
//! use nodemap_graph::Node;
//! use nodemap_scene::appearance::NodeAppearance;
//! use nodemap_scene::config::SceneConfig;
//! use nodemap_scene::registry::{EntityRegistry, EntityTag, NodeEntry};
//!
//! let node = Node::new("a", "alpha", "", Vec3::ZERO);
//! let appearance = NodeAppearance::for_node(&node, false, &SceneConfig::default());
//! let handle = EntityHandle::from_raw(7);
//!
//! let mut registry = EntityRegistry::new();
//! registry.insert_node(node.id().clone(), NodeEntry::new(handle, node.position, appearance));
//! assert_eq!(registry.tag(handle), Some(&EntityTag::Node(NodeId::new("a"))));
//! ```

use std::collections::HashMap;

use nodemap_core::Vec3;
use nodemap_core::event::EntityHandle;
use nodemap_core::geometry::ConnectorGeometry;
use nodemap_core::id::{ConnectionId, NodeId};

use crate::appearance::NodeAppearance;

/// The domain object an entity represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityTag {
    Node(NodeId),
    Connection(ConnectionId),
}

/// A rendered node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEntry {
    pub handle: EntityHandle,
    /// Position last written to the surface.
    pub rendered_position: Vec3,
    /// Appearance last written to the surface.
    pub appearance: NodeAppearance,
}

impl NodeEntry {
    #[must_use]
    pub fn new(handle: EntityHandle, rendered_position: Vec3, appearance: NodeAppearance) -> Self {
        Self {
            handle,
            rendered_position,
            appearance,
        }
    }
}

/// A rendered connector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorEntry {
    pub handle: EntityHandle,
    /// Geometry last written to the surface.
    pub geometry: ConnectorGeometry,
}

/// Node and connector entries plus the reverse handle lookup.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    nodes: HashMap<NodeId, NodeEntry>,
    connectors: HashMap<ConnectionId, ConnectorEntry>,
    tags: HashMap<EntityHandle, EntityTag>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node entity, replacing any previous entry for `id`.
    pub fn insert_node(&mut self, id: NodeId, entry: NodeEntry) {
        let handle = entry.handle;
        self.tags.insert(handle, EntityTag::Node(id.clone()));
        if let Some(old) = self.nodes.insert(id, entry) {
            if old.handle != handle {
                self.tags.remove(&old.handle);
            }
        }
    }

    /// Register a connector entity, replacing any previous entry for `id`.
    pub fn insert_connector(&mut self, id: ConnectionId, entry: ConnectorEntry) {
        let handle = entry.handle;
        self.tags.insert(handle, EntityTag::Connection(id.clone()));
        if let Some(old) = self.connectors.insert(id, entry) {
            if old.handle != handle {
                self.tags.remove(&old.handle);
            }
        }
    }

    /// Unregister a node entity.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<NodeEntry> {
        let entry = self.nodes.remove(id)?;
        self.tags.remove(&entry.handle);
        Some(entry)
    }

    /// Unregister a connector entity.
    pub fn remove_connector(&mut self, id: &ConnectionId) -> Option<ConnectorEntry> {
        let entry = self.connectors.remove(id)?;
        self.tags.remove(&entry.handle);
        Some(entry)
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeEntry> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut NodeEntry> {
        self.nodes.get_mut(id)
    }

    #[must_use]
    pub fn connector(&self, id: &ConnectionId) -> Option<&ConnectorEntry> {
        self.connectors.get(id)
    }

    pub fn connector_mut(&mut self, id: &ConnectionId) -> Option<&mut ConnectorEntry> {
        self.connectors.get_mut(id)
    }

    /// What `handle` represents.
    #[must_use]
    pub fn tag(&self, handle: EntityHandle) -> Option<&EntityTag> {
        self.tags.get(&handle)
    }

    /// The node `handle` represents, if it is a node entity.
    #[must_use]
    pub fn node_for_handle(&self, handle: EntityHandle) -> Option<&NodeId> {
        match self.tags.get(&handle)? {
            EntityTag::Node(id) => Some(id),
            EntityTag::Connection(_) => None,
        }
    }

    /// Registered node ids, in no particular order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Registered connection ids, in no particular order.
    pub fn connector_ids(&self) -> impl Iterator<Item = &ConnectionId> {
        self.connectors.keys()
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    /// Total number of registered entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
