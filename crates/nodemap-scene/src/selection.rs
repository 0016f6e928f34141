#![forbid(unsafe_code)]

//! Single-selection state machine.
//!
//! ```text
//!              tap(a)                      tap(b), b != a
//! Unselected ─────────▶ Selected(a) ─────────────────────▶ Selected(b)
//!     ▲                     │          effects: [Deselect(a), Select(b)]
//!     └─────────────────────┘
//!        tap(a) | node_removed(a)
//! ```
//!
//! Every transition returns the appearance effects it implies, in the
//! order they must be applied. A deselect always precedes the select that
//! caused it.

use nodemap_core::id::NodeId;
use smallvec::SmallVec;

/// Current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected(NodeId),
}

/// An appearance change a selection transition requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEffect {
    Deselect(NodeId),
    Select(NodeId),
}

impl SelectionEffect {
    /// The node whose appearance changes.
    #[must_use]
    pub fn node(&self) -> &NodeId {
        match self {
            Self::Deselect(id) | Self::Select(id) => id,
        }
    }

    /// The node's selection state after the effect.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        matches!(self, Self::Select(_))
    }
}

/// At most two effects per transition.
pub type SelectionEffects = SmallVec<[SelectionEffect; 2]>;

/// Owner of the selection state.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: SelectionState,
}

impl SelectionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// The selected node, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&NodeId> {
        match &self.state {
            SelectionState::Selected(id) => Some(id),
            SelectionState::Unselected => None,
        }
    }

    #[must_use]
    pub fn is_selected(&self, id: &NodeId) -> bool {
        self.selected() == Some(id)
    }

    /// Toggle `id`.
    pub fn tap(&mut self, id: &NodeId) -> SelectionEffects {
        let mut effects = SelectionEffects::new();
        match std::mem::take(&mut self.state) {
            SelectionState::Selected(current) if current == *id => {
                effects.push(SelectionEffect::Deselect(current));
            }
            SelectionState::Selected(previous) => {
                effects.push(SelectionEffect::Deselect(previous));
                effects.push(SelectionEffect::Select(id.clone()));
                self.state = SelectionState::Selected(id.clone());
            }
            SelectionState::Unselected => {
                effects.push(SelectionEffect::Select(id.clone()));
                self.state = SelectionState::Selected(id.clone());
            }
        }
        effects
    }

    /// Forget the selection if `id` was selected. Returns whether it was.
    ///
    /// No effect is produced: the node's entity is gone.
    pub fn node_removed(&mut self, id: &NodeId) -> bool {
        if self.is_selected(id) {
            self.state = SelectionState::Unselected;
            true
        } else {
            false
        }
    }
}
