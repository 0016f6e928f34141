#![forbid(unsafe_code)]

//! Scene configuration.

use nodemap_core::geometry::Bounds3;
use nodemap_core::label::LabelMetrics;
use nodemap_core::projection::GestureSpace;

/// Tunables for the scene engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    /// Volume a dragged node is clamped into.
    pub bounds: Bounds3,
    /// Label plate sizing.
    pub label_metrics: LabelMetrics,
    /// Uniform scale of a node while it is being dragged.
    pub drag_scale: f32,
    /// Resting scale of the selected node.
    pub selected_scale: f32,
    /// Resting scale of every other node.
    pub resting_scale: f32,
    /// Radius of connector cylinders, in meters.
    pub connector_radius: f32,
    /// Depth of a node's hit extent, in meters.
    pub hit_depth: f32,
    /// Position changes at or below this distance are not re-rendered.
    pub position_epsilon: f32,
    /// Conversion of gesture translations into world space.
    pub gesture_space: GestureSpace,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds3::movement_volume(),
            label_metrics: LabelMetrics::default(),
            drag_scale: 1.1,
            selected_scale: 1.2,
            resting_scale: 1.0,
            connector_radius: 0.002,
            hit_depth: 0.02,
            position_epsilon: 1e-6,
            gesture_space: GestureSpace::default(),
        }
    }
}

impl SceneConfig {
    #[must_use]
    pub fn with_bounds(mut self, bounds: Bounds3) -> Self {
        self.bounds = bounds;
        self
    }

    #[must_use]
    pub fn with_label_metrics(mut self, metrics: LabelMetrics) -> Self {
        self.label_metrics = metrics;
        self
    }

    #[must_use]
    pub fn with_drag_scale(mut self, scale: f32) -> Self {
        self.drag_scale = scale;
        self
    }

    #[must_use]
    pub fn with_selected_scale(mut self, scale: f32) -> Self {
        self.selected_scale = scale;
        self
    }

    #[must_use]
    pub fn with_connector_radius(mut self, radius: f32) -> Self {
        self.connector_radius = radius;
        self
    }

    #[must_use]
    pub fn with_position_epsilon(mut self, epsilon: f32) -> Self {
        self.position_epsilon = epsilon;
        self
    }

    #[must_use]
    pub fn with_gesture_space(mut self, space: GestureSpace) -> Self {
        self.gesture_space = space;
        self
    }

    /// Resting scale for a node in the given selection state.
    #[inline]
    #[must_use]
    pub fn resting_scale_for(&self, selected: bool) -> f32 {
        if selected {
            self.selected_scale
        } else {
            self.resting_scale
        }
    }
}
