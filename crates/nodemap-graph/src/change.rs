#![forbid(unsafe_code)]

//! Change notification for graph mutations.
//!
//! Every successful mutation of a [`GraphStore`](crate::store::GraphStore)
//! pushes one [`GraphChange`] into each live [`ChangeFeed`]. Feeds are
//! channels: the store never calls back into a subscriber while it is
//! mutating, so a subscriber that also mutates the store (the scene engine
//! writing drag positions) cannot re-enter it.
//!
//! A dropped feed is pruned on the next notification.

use std::sync::mpsc;

use nodemap_core::id::{ConnectionId, NodeId};

/// What changed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphChange {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    /// Only the node's position changed.
    NodeMoved(NodeId),
    /// The node's name or detail changed.
    NodeEdited(NodeId),
    ConnectionAdded(ConnectionId),
    ConnectionRemoved(ConnectionId),
    /// The store adopted a new snapshot from its persistence backend.
    Reloaded,
}

/// Receiving end of a store subscription.
#[derive(Debug)]
pub struct ChangeFeed {
    rx: mpsc::Receiver<GraphChange>,
}

impl ChangeFeed {
    /// Take every pending change, oldest first, without blocking.
    pub fn drain(&self) -> Vec<GraphChange> {
        self.rx.try_iter().collect()
    }

    /// Take the oldest pending change, if any.
    pub fn try_next(&self) -> Option<GraphChange> {
        self.rx.try_recv().ok()
    }
}

/// Sending side owned by the store.
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Vec<mpsc::Sender<GraphChange>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self) -> ChangeFeed {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        ChangeFeed { rx }
    }

    pub(crate) fn notify(&mut self, change: GraphChange) {
        self.senders.retain(|tx| tx.send(change.clone()).is_ok());
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }
}
