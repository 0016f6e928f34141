#![forbid(unsafe_code)]

//! Scripted nodemap session.
//!
//! The binary opens a store (in memory or a JSON state file), seeds the
//! sample graph into it when empty, and plays a short script of taps,
//! drags and edits against a [`nodemap::CanvasSurface`], printing a frame
//! after each step.

pub mod cli;
pub mod script;

use std::collections::HashMap;

use nodemap::{GraphSnapshot, GraphStore};

/// Copy the sample graph into `store` under fresh ids.
///
/// Returns the number of nodes added.
pub fn seed_sample(store: &mut GraphStore) -> usize {
    let sample = GraphSnapshot::sample();
    let mut ids = HashMap::new();
    for node in &sample.nodes {
        let id = store.add_node(node.name.clone(), node.detail.clone(), Some(node.position));
        ids.insert(node.id().clone(), id);
    }
    for connection in &sample.connections {
        if let (Some(from), Some(to)) = (ids.get(&connection.from), ids.get(&connection.to)) {
            store.add_connection(from, to);
        }
    }
    sample.nodes.len()
}
