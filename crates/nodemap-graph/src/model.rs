#![forbid(unsafe_code)]

//! Node and connection records.

use nodemap_core::Vec3;
use nodemap_core::id::{ConnectionId, NodeId};

/// A labeled point in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    /// Display label.
    pub name: String,
    /// Longer description; may be empty.
    pub detail: String,
    /// World-space position in meters. Always finite.
    pub position: Vec3,
}

impl Node {
    /// Create a node record.
    #[must_use]
    pub fn new(
        id: impl Into<NodeId>,
        name: impl Into<String>,
        detail: impl Into<String>,
        position: Vec3,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            detail: detail.into(),
            position,
        }
    }

    /// The node's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Label text: the name, or name and detail on two lines when expanded
    /// and the detail is non-empty.
    #[must_use]
    pub fn label_text(&self, expanded: bool) -> String {
        if expanded && !self.detail.is_empty() {
            format!("{}\n{}", self.name, self.detail)
        } else {
            self.name.clone()
        }
    }

    /// Whether an expanded label would show more than the name.
    #[inline]
    #[must_use]
    pub fn has_detail(&self) -> bool {
        !self.detail.is_empty()
    }

    /// `x: 0.00, y: 0.00, z: 0.00`
    #[must_use]
    pub fn position_description(&self) -> String {
        let p = self.position;
        format!("x: {:.2}, y: {:.2}, z: {:.2}", p.x, p.y, p.z)
    }

    /// `x: 0.00 m, y: 0.00 m, z: 0.00 m`
    #[must_use]
    pub fn position_description_meters(&self) -> String {
        let p = self.position;
        format!("x: {:.2} m, y: {:.2} m, z: {:.2} m", p.x, p.y, p.z)
    }
}

/// An undirected edge between two distinct nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    id: ConnectionId,
    /// Endpoint the connection was created from.
    pub from: NodeId,
    /// Endpoint the connection was created to.
    pub to: NodeId,
}

impl Connection {
    /// Create a connection record.
    #[must_use]
    pub fn new(id: impl Into<ConnectionId>, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// The connection's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Check if either endpoint is `node`.
    #[inline]
    #[must_use]
    pub fn touches(&self, node: &NodeId) -> bool {
        self.from == *node || self.to == *node
    }

    /// Check if this connection joins `a` and `b` in either direction.
    #[inline]
    #[must_use]
    pub fn joins(&self, a: &NodeId, b: &NodeId) -> bool {
        (self.from == *a && self.to == *b) || (self.from == *b && self.to == *a)
    }

    /// The endpoint opposite `node`, if `node` is an endpoint.
    #[must_use]
    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if self.from == *node {
            Some(&self.to)
        } else if self.to == *node {
            Some(&self.from)
        } else {
            None
        }
    }
}
