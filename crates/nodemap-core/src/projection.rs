#![forbid(unsafe_code)]

//! Mapping between world space, gesture space, and 2D view space.
//!
//! The 2D view is an orthographic projection onto the XY plane:
//!
//! ```text
//! view.x = width  / 2 + world.x * points_per_meter
//! view.y = height / 2 - world.y * points_per_meter     (Y flipped)
//! ```
//!
//! World Y increases upward, view Y increases downward. The inverse places
//! the point on the viewport's projection plane (`plane_z`).

use glam::{Vec2, Vec3};

/// A 2D view onto the world's XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// View width in points.
    pub width: f32,
    /// View height in points.
    pub height: f32,
    /// Scale factor: view points per world meter.
    pub points_per_meter: f32,
    /// Lower edge of the vertical clamp band, in view points. Only the 2D
    /// projection surface applies the band; the mapping itself is affine.
    pub max_height: f32,
    /// World Z assigned to points mapped back from the view.
    pub plane_z: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            points_per_meter: 300.0,
            max_height: 600.0,
            plane_z: -1.5,
        }
    }
}

impl Viewport {
    /// Create a viewport of the given size; the clamp band covers the full height.
    #[must_use]
    pub fn new(width: f32, height: f32, points_per_meter: f32) -> Self {
        Self {
            width,
            height,
            points_per_meter,
            max_height: height,
            ..Self::default()
        }
    }

    /// Set the vertical clamp band.
    #[must_use]
    pub fn with_max_height(mut self, max_height: f32) -> Self {
        self.max_height = max_height;
        self
    }

    /// Set the projection plane depth.
    #[must_use]
    pub fn with_plane_z(mut self, plane_z: f32) -> Self {
        self.plane_z = plane_z;
        self
    }

    /// View-space center (the image of the world origin).
    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Check if a view point lies inside the viewport.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }

    /// Clamp a view point's Y into `[0, max_height]`.
    #[must_use]
    pub fn clamp_to_band(&self, point: Vec2) -> Vec2 {
        Vec2::new(point.x, point.y.max(0.0).min(self.max_height.max(0.0)))
    }

    /// Convert a view-space drag delta into a world-space delta on the plane.
    #[must_use]
    pub fn view_delta_to_world(&self, delta: Vec2) -> Vec3 {
        if self.points_per_meter == 0.0 {
            return Vec3::ZERO;
        }
        Vec3::new(
            delta.x / self.points_per_meter,
            -delta.y / self.points_per_meter,
            0.0,
        )
    }
}

/// Map a world position to view coordinates. Z is dropped.
#[inline]
#[must_use]
pub fn world_to_view(position: Vec3, viewport: &Viewport) -> Vec2 {
    let c = viewport.center();
    Vec2::new(
        c.x + position.x * viewport.points_per_meter,
        c.y - position.y * viewport.points_per_meter,
    )
}

/// Map a view point back to world space on the viewport's projection plane.
///
/// A degenerate viewport (zero scale) maps every point to the plane origin.
#[inline]
#[must_use]
pub fn view_to_world(point: Vec2, viewport: &Viewport) -> Vec3 {
    if viewport.points_per_meter == 0.0 {
        return Vec3::new(0.0, 0.0, viewport.plane_z);
    }
    let c = viewport.center();
    Vec3::new(
        (point.x - c.x) / viewport.points_per_meter,
        (c.y - point.y) / viewport.points_per_meter,
        viewport.plane_z,
    )
}

/// Conversion from immersive gesture translations to world deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSpace {
    /// World meters per gesture unit.
    pub meters_per_unit: f32,
}

impl Default for GestureSpace {
    fn default() -> Self {
        Self {
            meters_per_unit: 1.0,
        }
    }
}

impl GestureSpace {
    /// Convert a gesture translation into a world-space translation.
    #[inline]
    #[must_use]
    pub fn to_world(&self, translation: Vec3) -> Vec3 {
        translation * self.meters_per_unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_maps_to_center() {
        let vp = Viewport::new(800.0, 600.0, 100.0);
        assert_eq!(world_to_view(Vec3::ZERO, &vp), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn y_is_flipped() {
        let vp = Viewport::new(800.0, 600.0, 100.0);
        let up = world_to_view(Vec3::new(0.0, 1.0, 0.0), &vp);
        assert_eq!(up, Vec2::new(400.0, 200.0));
    }

    #[test]
    fn view_to_world_uses_plane_depth() {
        let vp = Viewport::new(800.0, 600.0, 100.0).with_plane_z(-2.0);
        let w = view_to_world(Vec2::new(500.0, 100.0), &vp);
        assert_eq!(w, Vec3::new(1.0, 2.0, -2.0));
    }

    #[test]
    fn round_trip_on_plane() {
        let vp = Viewport::default();
        let p = Vec3::new(-0.42, 0.5, vp.plane_z);
        let back = view_to_world(world_to_view(p, &vp), &vp);
        assert!(back.abs_diff_eq(p, 1e-5));
    }

    #[test]
    fn view_delta_flips_y() {
        let vp = Viewport::new(800.0, 600.0, 100.0);
        let d = vp.view_delta_to_world(Vec2::new(50.0, 50.0));
        assert_eq!(d, Vec3::new(0.5, -0.5, 0.0));
    }

    #[test]
    fn zero_scale_viewport_does_not_divide_by_zero() {
        let vp = Viewport::new(800.0, 600.0, 0.0);
        assert_eq!(vp.view_delta_to_world(Vec2::ONE), Vec3::ZERO);
        assert!(view_to_world(Vec2::ONE, &vp).is_finite());
    }

    #[test]
    fn band_clamps_only_y() {
        let vp = Viewport::new(800.0, 600.0, 100.0).with_max_height(400.0);
        assert_eq!(vp.clamp_to_band(Vec2::new(-20.0, 500.0)), Vec2::new(-20.0, 400.0));
        assert_eq!(vp.clamp_to_band(Vec2::new(10.0, -5.0)), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn gesture_space_scales_translation() {
        let gs = GestureSpace {
            meters_per_unit: 0.5,
        };
        assert_eq!(gs.to_world(Vec3::new(2.0, 0.0, -4.0)), Vec3::new(1.0, 0.0, -2.0));
    }
}
