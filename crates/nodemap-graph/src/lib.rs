#![forbid(unsafe_code)]

//! nodemap graph model
//!
//! The canonical node/connection collections and everything that observes
//! or persists them.
//!
//! # Key Components
//!
//! - [`GraphStore`] - Single source of truth with invariant-preserving CRUD
//! - [`ChangeFeed`] - Push-based stream of [`GraphChange`]s per subscriber
//! - [`PersistenceBackend`] - Record store the graph writes through to
//! - [`MemoryBackend`] - In-memory backend for tests and ephemeral sessions
//! - `FileBackend` - JSON file backend (feature `file-storage`)
//!
//! # How it fits in the system
//! `nodemap-scene` subscribes to the store and reconciles its entity
//! registry against the store's collections. The store knows nothing of
//! rendering.

pub mod change;
pub mod model;
pub mod persistence;
pub mod snapshot;
pub mod store;

pub use change::{ChangeFeed, GraphChange};
pub use model::{Connection, Node};
#[cfg(feature = "file-storage")]
pub use persistence::FileBackend;
pub use persistence::{MemoryBackend, PersistenceBackend, PersistenceError, PersistenceResult};
pub use snapshot::{GraphSnapshot, Record, RecordKey};
pub use store::{GraphStore, PersistenceConfig};
