#![forbid(unsafe_code)]

//! nodemap public facade crate.
//!
//! Re-exports the graph store, the scene engine and the core value types
//! behind one dependency, with a prelude for day-to-day use.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use nodemap_core::event::{EntityHandle, GestureEvent};
pub use nodemap_core::geometry::{Bounds3, ConnectorGeometry, Transform, connector_geometry};
pub use nodemap_core::id::{ConnectionId, NodeId};
pub use nodemap_core::label::{LabelMetrics, LabelSize};
pub use nodemap_core::projection::{GestureSpace, Viewport};
pub use nodemap_core::{Quat, Vec2, Vec3};

#[cfg(feature = "subscriber")]
pub use nodemap_core::logging::{LogConfig, LogFormat, LogInitError};

// --- Graph re-exports ------------------------------------------------------

pub use nodemap_graph::{
    ChangeFeed, Connection, GraphChange, GraphSnapshot, GraphStore, MemoryBackend, Node,
    PersistenceBackend, PersistenceConfig, PersistenceError,
};

#[cfg(feature = "file-storage")]
pub use nodemap_graph::FileBackend;

// --- Scene re-exports ------------------------------------------------------

pub use nodemap_scene::{
    CanvasShape, CanvasSurface, DragPhase, EntityRegistry, HeadlessSurface, NodeAppearance,
    PresentationSurface, ReconcileReport, SceneConfig, SceneSession, SceneSyncEngine,
    SelectionController, SelectionState, SurfaceCall,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for nodemap applications.
#[derive(Debug)]
pub enum Error {
    /// A persistence backend failed.
    Persistence(PersistenceError),
    /// The logging subscriber could not be installed.
    #[cfg(feature = "subscriber")]
    Logging(LogInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistence(err) => write!(f, "persistence: {err}"),
            #[cfg(feature = "subscriber")]
            Self::Logging(err) => write!(f, "logging: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            #[cfg(feature = "subscriber")]
            Self::Logging(err) => Some(err),
        }
    }
}

impl From<PersistenceError> for Error {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}

#[cfg(feature = "subscriber")]
impl From<LogInitError> for Error {
    fn from(err: LogInitError) -> Self {
        Self::Logging(err)
    }
}

/// Standard result type for nodemap APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Connection, Error, GestureEvent, GraphStore, HeadlessSurface, Node, NodeId,
        PresentationSurface, Result, SceneConfig, SceneSession, SceneSyncEngine, Vec3,
    };

    pub use crate::{core, graph, scene};
}

pub use nodemap_core as core;
pub use nodemap_graph as graph;
pub use nodemap_scene as scene;
