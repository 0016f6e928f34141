#![forbid(unsafe_code)]

//! Drag sessions.
//!
//! # Invariants
//!
//! 1. At most one session exists at a time; it names the dragged node.
//! 2. The target of every update is `captured + translation`, clamped to
//!    the movement bounds. Translations are cumulative since the start, so
//!    repeated updates never accumulate drift.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Update without start | Lost `DragStart` | Implicit start at the rendered position |
//! | Update for another node | Second concurrent gesture | Ignored |
//! | Non-finite translation | Upstream conversion bug | Update ignored |
//! | Dragged node removed | External deletion | Session dropped |

use nodemap_core::Vec3;
use nodemap_core::geometry::{Bounds3, clamp_to_bounds};
use nodemap_core::id::NodeId;

/// Phase of a drag gesture, with a world-space translation for updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragPhase {
    Started,
    /// Cumulative world-space translation since the drag started.
    Changed(Vec3),
    Ended,
}

/// State captured when a drag starts.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    node: NodeId,
    captured: Vec3,
    last_target: Vec3,
}

impl DragSession {
    /// Start dragging `node` from `captured`.
    #[must_use]
    pub fn begin(node: NodeId, captured: Vec3) -> Self {
        Self {
            node,
            captured,
            last_target: captured,
        }
    }

    /// The dragged node.
    #[must_use]
    pub fn node(&self) -> &NodeId {
        &self.node
    }

    /// Position the drag started from.
    #[must_use]
    pub fn captured(&self) -> Vec3 {
        self.captured
    }

    /// Most recent clamped target.
    #[must_use]
    pub fn last_target(&self) -> Vec3 {
        self.last_target
    }

    /// Clamped target for a cumulative `translation`; `None` if not finite.
    pub fn advance(&mut self, translation: Vec3, bounds: &Bounds3) -> Option<Vec3> {
        let target = self.captured + translation;
        if !target.is_finite() {
            return None;
        }
        self.last_target = clamp_to_bounds(target, bounds);
        Some(self.last_target)
    }
}
