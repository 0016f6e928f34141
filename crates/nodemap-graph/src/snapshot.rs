#![forbid(unsafe_code)]

//! Plain collections of nodes and connections.

use nodemap_core::Vec3;
use nodemap_core::id::{ConnectionId, NodeId};

use crate::model::{Connection, Node};

/// Full contents of a graph, in collection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

/// A record to write to a persistence backend.
#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    Node(&'a Node),
    Connection(&'a Connection),
}

/// Key of a record to delete from a persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Node(NodeId),
    Connection(ConnectionId),
}

impl GraphSnapshot {
    /// Create a snapshot from collections.
    #[must_use]
    pub fn new(nodes: Vec<Node>, connections: Vec<Connection>) -> Self {
        Self { nodes, connections }
    }

    /// Five nodes near eye level and one connection between two of them.
    #[must_use]
    pub fn sample() -> Self {
        let nodes = vec![
            Node::new("0", "test node", "This is a test node", Vec3::ZERO),
            Node::new(
                "1",
                "node one",
                "This is a test node one",
                Vec3::new(-0.420_164_1, 1.505_808_6, -1.5),
            ),
            Node::new(
                "2",
                "node two",
                "This is a test node two",
                Vec3::new(-0.058_503_926, 1.434_132_8, -1.5),
            ),
            Node::new(
                "3",
                "node three",
                "This is a test node three",
                Vec3::new(-0.389_824_27, 1.304_730_4, -1.5),
            ),
            Node::new(
                "4",
                "very long center node",
                "This is a test node with very long description that is placed in the center",
                Vec3::new(-0.267_371_12, 1.402_437_4, -1.5),
            ),
        ];
        let connections = vec![Connection::new("conn1", "1", "2")];
        Self { nodes, connections }
    }

    /// Insert or replace a record, keeping collection order for replacements.
    pub fn upsert(&mut self, record: Record<'_>) {
        match record {
            Record::Node(node) => {
                match self.nodes.iter_mut().find(|n| n.id() == node.id()) {
                    Some(slot) => *slot = node.clone(),
                    None => self.nodes.push(node.clone()),
                }
            }
            Record::Connection(conn) => {
                match self.connections.iter_mut().find(|c| c.id() == conn.id()) {
                    Some(slot) => *slot = conn.clone(),
                    None => self.connections.push(conn.clone()),
                }
            }
        }
    }

    /// Remove a record. Returns whether anything was removed.
    pub fn remove(&mut self, key: &RecordKey) -> bool {
        match key {
            RecordKey::Node(id) => {
                let before = self.nodes.len();
                self.nodes.retain(|n| n.id() != id);
                before != self.nodes.len()
            }
            RecordKey::Connection(id) => {
                let before = self.connections.len();
                self.connections.retain(|c| c.id() != id);
                before != self.connections.len()
            }
        }
    }
}
