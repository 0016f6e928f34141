#![forbid(unsafe_code)]

//! nodemap scene
//!
//! Keeps renderable entities in agreement with a [`nodemap_graph::GraphStore`].
//!
//! # Key Components
//!
//! - [`SceneSyncEngine`] - Reconciliation, drag and tap routing, change-feed sync
//! - [`EntityRegistry`] - Bidirectional id ↔ entity handle table
//! - [`SelectionController`] - Single-selection state machine
//! - [`PresentationSurface`] - The five-call contract a renderer implements
//! - [`HeadlessSurface`] / [`CanvasSurface`] - Recording and 2D projection surfaces
//! - [`SceneSession`] - Owner of a store and its engine
//!
//! # How it fits in the system
//! The engine reads the store, writes positions back to it during drags,
//! and never touches a concrete renderer: everything visible goes through
//! a [`PresentationSurface`].

pub mod appearance;
pub mod canvas;
pub mod config;
pub mod drag;
pub mod headless;
pub mod registry;
pub mod selection;
pub mod session;
pub mod surface;
pub mod sync;

pub use appearance::{FontWeight, Material, NodeAppearance, Rgba};
pub use canvas::{CanvasShape, CanvasSurface};
pub use config::SceneConfig;
pub use drag::{DragPhase, DragSession};
pub use headless::{HeadlessEntity, HeadlessSurface, SurfaceCall};
pub use registry::{ConnectorEntry, EntityRegistry, EntityTag, NodeEntry};
pub use selection::{SelectionController, SelectionEffect, SelectionState};
pub use session::SceneSession;
pub use surface::PresentationSurface;
pub use sync::{ReconcileReport, SceneSyncEngine, SyncScope};
