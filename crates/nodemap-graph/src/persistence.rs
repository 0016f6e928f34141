#![forbid(unsafe_code)]

//! Pluggable persistence for graph records.
//!
//! The [`GraphStore`](crate::store::GraphStore) writes through to a
//! [`PersistenceBackend`] after every mutation and re-reads it afterwards.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        GraphStore                             │
//! │   - Canonical in-memory nodes + connections                   │
//! │   - save/delete after each mutation, then load_all            │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    PersistenceBackend                         │
//! │   - MemoryBackend: in-memory (testing, ephemeral)             │
//! │   - FileBackend: JSON file (requires file-storage)            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `PersistenceError::Io` | File I/O failure | Logged by the store, memory kept |
//! | `PersistenceError::Serialization` | JSON encode/decode | Logged by the store, memory kept |
//! | `PersistenceError::Corruption` | Poisoned lock, invalid record | Invalid records skipped on load |
//! | `PersistenceError::Unavailable` | Backend offline | Logged by the store, memory kept |
//!
//! The store never rolls back memory on a failed write, so memory and
//! storage may diverge until the next successful write.

use std::fmt;
use std::sync::RwLock;

use crate::model::Connection;
use crate::snapshot::{GraphSnapshot, Record, RecordKey};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from persistence backends.
#[derive(Debug)]
pub enum PersistenceError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    Serialization(String),
    /// Stored data is corrupted or invalid.
    Corruption(String),
    /// Backend is not reachable.
    Unavailable(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Serialization(msg) => write!(f, "serialization error: {msg}"),
            Self::Corruption(msg) => write!(f, "storage corruption: {msg}"),
            Self::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Serialization(_) | Self::Corruption(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

// ─────────────────────────────────────────────────────────────────────────────
// Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A record store for nodes and connections.
///
/// Calls are synchronous and made from the store's owner context.
pub trait PersistenceBackend: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Load every stored record. Empty on first run.
    fn load_all(&self) -> PersistenceResult<GraphSnapshot>;

    /// Insert or replace one record.
    fn save(&self, record: Record<'_>) -> PersistenceResult<()>;

    /// Delete one record. Deleting a missing record succeeds.
    fn delete(&self, key: &RecordKey) -> PersistenceResult<()>;

    /// Stored connections matching `predicate`.
    fn query_connections(
        &self,
        predicate: &dyn Fn(&Connection) -> bool,
    ) -> PersistenceResult<Vec<Connection>> {
        Ok(self
            .load_all()?
            .connections
            .into_iter()
            .filter(|c| predicate(c))
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Backend (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory backend for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryBackend {
    data: RwLock<GraphSnapshot>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-populated with a snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: GraphSnapshot) -> Self {
        Self {
            data: RwLock::new(snapshot),
        }
    }
}

impl PersistenceBackend for MemoryBackend {
    fn name(&self) -> &str {
        "MemoryBackend"
    }

    fn load_all(&self) -> PersistenceResult<GraphSnapshot> {
        let guard = self
            .data
            .read()
            .map_err(|_| PersistenceError::Corruption("lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save(&self, record: Record<'_>) -> PersistenceResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| PersistenceError::Corruption("lock poisoned".into()))?;
        guard.upsert(record);
        Ok(())
    }

    fn delete(&self, key: &RecordKey) -> PersistenceResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| PersistenceError::Corruption("lock poisoned".into()))?;
        guard.remove(key);
        Ok(())
    }

    fn query_connections(
        &self,
        predicate: &dyn Fn(&Connection) -> bool,
    ) -> PersistenceResult<Vec<Connection>> {
        let guard = self
            .data
            .read()
            .map_err(|_| PersistenceError::Corruption("lock poisoned".into()))?;
        Ok(guard
            .connections
            .iter()
            .filter(|c| predicate(c))
            .cloned()
            .collect())
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (nodes, connections) = self
            .data
            .read()
            .map(|g| (g.nodes.len(), g.connections.len()))
            .unwrap_or((0, 0));
        f.debug_struct("MemoryBackend")
            .field("nodes", &nodes)
            .field("connections", &connections)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Backend (requires file-storage feature)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "file-storage")]
mod file_backend {
    use super::*;
    use crate::model::Node;
    use nodemap_core::Vec3;
    use serde::{Deserialize, Serialize};
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::{Path, PathBuf};

    /// On-disk layout (JSON).
    #[derive(Serialize, Deserialize)]
    struct GraphFile {
        /// Format version for future migrations.
        format_version: u32,
        nodes: Vec<FileNode>,
        connections: Vec<FileConnection>,
    }

    #[derive(Serialize, Deserialize)]
    struct FileNode {
        id: String,
        name: String,
        #[serde(default)]
        detail: String,
        position: [f32; 3],
    }

    #[derive(Serialize, Deserialize)]
    struct FileConnection {
        id: String,
        from: String,
        to: String,
    }

    impl GraphFile {
        const FORMAT_VERSION: u32 = 1;

        fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
            Self {
                format_version: Self::FORMAT_VERSION,
                nodes: snapshot
                    .nodes
                    .iter()
                    .map(|n| FileNode {
                        id: n.id().to_string(),
                        name: n.name.clone(),
                        detail: n.detail.clone(),
                        position: n.position.to_array(),
                    })
                    .collect(),
                connections: snapshot
                    .connections
                    .iter()
                    .map(|c| FileConnection {
                        id: c.id().to_string(),
                        from: c.from.to_string(),
                        to: c.to.to_string(),
                    })
                    .collect(),
            }
        }

        fn into_snapshot(self) -> GraphSnapshot {
            let mut snapshot = GraphSnapshot::default();
            for node in self.nodes {
                let position = Vec3::from_array(node.position);
                if !position.is_finite() {
                    tracing::warn!(id = %node.id, "non-finite node position in state file, skipping");
                    continue;
                }
                snapshot
                    .nodes
                    .push(Node::new(node.id, node.name, node.detail, position));
            }
            for conn in self.connections {
                snapshot
                    .connections
                    .push(Connection::new(conn.id, conn.from, conn.to));
            }
            snapshot
        }
    }

    /// JSON file backend.
    ///
    /// Every write rewrites the whole file through a temporary file and a
    /// rename, so a crash mid-write leaves the previous contents intact:
    /// 1. Write to `{path}.tmp`
    /// 2. Flush and sync
    /// 3. Rename `{path}.tmp` -> `{path}`
    pub struct FileBackend {
        path: PathBuf,
    }

    impl FileBackend {
        /// Create a backend at the given path. The file is created on first write.
        #[must_use]
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }

        /// The backing file path.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn temp_path(&self) -> PathBuf {
            let mut tmp = self.path.clone();
            tmp.set_extension("json.tmp");
            tmp
        }

        fn write_snapshot(&self, snapshot: &GraphSnapshot) -> PersistenceResult<()> {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }

            let tmp_path = self.temp_path();
            {
                let file = File::create(&tmp_path)?;
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, &GraphFile::from_snapshot(snapshot))
                    .map_err(|e| {
                        PersistenceError::Serialization(format!("failed to serialize graph: {e}"))
                    })?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp_path, &self.path)?;

            tracing::debug!(
                path = %self.path.display(),
                nodes = snapshot.nodes.len(),
                connections = snapshot.connections.len(),
                "wrote graph file"
            );
            Ok(())
        }
    }

    impl PersistenceBackend for FileBackend {
        fn name(&self) -> &str {
            "FileBackend"
        }

        fn load_all(&self) -> PersistenceResult<GraphSnapshot> {
            if !self.path.exists() {
                return Ok(GraphSnapshot::default());
            }

            let reader = BufReader::new(File::open(&self.path)?);
            let file: GraphFile = serde_json::from_reader(reader).map_err(|e| {
                PersistenceError::Serialization(format!("failed to parse graph file: {e}"))
            })?;

            if file.format_version != GraphFile::FORMAT_VERSION {
                tracing::warn!(
                    stored = file.format_version,
                    expected = GraphFile::FORMAT_VERSION,
                    "graph file format version mismatch, ignoring stored graph"
                );
                return Ok(GraphSnapshot::default());
            }

            Ok(file.into_snapshot())
        }

        fn save(&self, record: Record<'_>) -> PersistenceResult<()> {
            let mut snapshot = self.load_all()?;
            snapshot.upsert(record);
            self.write_snapshot(&snapshot)
        }

        fn delete(&self, key: &RecordKey) -> PersistenceResult<()> {
            let mut snapshot = self.load_all()?;
            if snapshot.remove(key) {
                self.write_snapshot(&snapshot)?;
            }
            Ok(())
        }
    }

    impl fmt::Debug for FileBackend {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileBackend")
                .field("path", &self.path)
                .finish()
        }
    }
}

#[cfg(feature = "file-storage")]
pub use file_backend::FileBackend;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;
    use nodemap_core::Vec3;
    use nodemap_core::id::{ConnectionId, NodeId};

    #[test]
    fn memory_backend_starts_empty() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.load_all().unwrap(), GraphSnapshot::default());
    }

    #[test]
    fn memory_backend_save_and_delete() {
        let backend = MemoryBackend::new();
        let node = Node::new("a", "alpha", "", Vec3::ZERO);
        backend.save(Record::Node(&node)).unwrap();
        let conn = Connection::new("c", "a", "b");
        backend.save(Record::Connection(&conn)).unwrap();

        let loaded = backend.load_all().unwrap();
        assert_eq!(loaded.nodes, vec![node]);
        assert_eq!(loaded.connections, vec![conn]);

        backend.delete(&RecordKey::Node(NodeId::new("a"))).unwrap();
        backend
            .delete(&RecordKey::Connection(ConnectionId::new("c")))
            .unwrap();
        // Deleting a missing record is not an error.
        backend.delete(&RecordKey::Node(NodeId::new("a"))).unwrap();
        assert_eq!(backend.load_all().unwrap(), GraphSnapshot::default());
    }

    #[test]
    fn memory_backend_query_connections() {
        let backend = MemoryBackend::with_snapshot(GraphSnapshot::sample());
        let one = NodeId::new("1");
        let hits = backend.query_connections(&|c| c.touches(&one)).unwrap();
        assert_eq!(hits.len(), 1);
        let none = backend.query_connections(&|c| c.touches(&NodeId::new("0"))).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn error_display_and_source() {
        let io = PersistenceError::from(std::io::Error::other("disk gone"));
        assert!(io.to_string().contains("disk gone"));
        assert!(std::error::Error::source(&io).is_some());
        let corrupt = PersistenceError::Corruption("bad".into());
        assert_eq!(corrupt.to_string(), "storage corruption: bad");
        assert!(std::error::Error::source(&corrupt).is_none());
    }

    #[test]
    fn memory_backend_debug_shows_counts() {
        let backend = MemoryBackend::with_snapshot(GraphSnapshot::sample());
        let dbg = format!("{backend:?}");
        assert!(dbg.contains("nodes: 5"));
        assert!(dbg.contains("connections: 1"));
    }
}
