#![forbid(unsafe_code)]

//! Canonical gesture event types.
//!
//! Gesture events target an [`EntityHandle`] on the presentation surface.
//! The scene engine resolves the handle back to the node it represents.
//!
//! # Design Notes
//!
//! - Drag translations are cumulative since the drag started, not
//!   per-update increments, so repeated updates never accumulate drift.
//! - Events for one drag arrive serialized: `DragStart`, any number of
//!   `DragUpdate`, then `DragEnd`. A `DragUpdate` may arrive without a
//!   preceding `DragStart`; consumers treat it as an implicit start.

use std::fmt;

use glam::Vec3;

/// Opaque reference to a renderable entity on a presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Wrap a raw surface-assigned handle value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Canonical gesture event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// A drag began on the entity.
    DragStart {
        handle: EntityHandle,
    },

    /// The drag moved. `translation` is world-space and cumulative since start.
    DragUpdate {
        handle: EntityHandle,
        translation: Vec3,
    },

    /// The drag ended.
    DragEnd {
        handle: EntityHandle,
    },

    /// The entity was tapped.
    Tap {
        handle: EntityHandle,
    },
}

impl GestureEvent {
    /// The entity this event targets.
    #[must_use]
    pub const fn handle(&self) -> EntityHandle {
        match *self {
            Self::DragStart { handle }
            | Self::DragUpdate { handle, .. }
            | Self::DragEnd { handle }
            | Self::Tap { handle } => handle,
        }
    }

    /// Check if this event belongs to a drag gesture.
    #[must_use]
    pub const fn is_drag(&self) -> bool {
        !matches!(self, Self::Tap { .. })
    }
}
