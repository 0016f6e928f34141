#![forbid(unsafe_code)]

//! World-space geometric primitives.
//!
//! Positions are `glam::Vec3` in meters with Y up. This module holds the
//! pure pieces of the geometry mapper that do not involve a 2D view:
//! movement bounds, connector geometry, and entity transforms.
//!
//! # Invariants
//!
//! 1. `clamp_to_bounds` never returns a component outside the bounds.
//! 2. `connector_geometry` never produces NaN: coincident endpoints yield
//!    `None`, and directions parallel to the reference axis yield identity.

use glam::{Quat, Vec3};

/// Endpoints closer than this (meters) produce no connector geometry.
pub const CONNECTOR_EPSILON: f32 = 1e-4;

/// Canonical connector axis. Connector primitives are unit-length cylinders
/// extruded along this axis.
pub const REFERENCE_AXIS: Vec3 = Vec3::Y;

/// How close `|dot(direction, REFERENCE_AXIS)|` must be to 1 for the
/// direction to count as parallel.
const PARALLEL_TOLERANCE: f32 = 1e-6;

/// Axis-aligned movement limits for draggable entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    /// Minimum corner (inclusive).
    pub min: Vec3,
    /// Maximum corner (inclusive).
    pub max: Vec3,
}

impl Bounds3 {
    /// Create bounds from two corners in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// The interactive volume nodes may be dragged within:
    /// x ∈ [-1, 1], y ∈ [-1, 1], z ∈ [-3, -0.5].
    #[must_use]
    pub fn movement_volume() -> Self {
        Self {
            min: Vec3::new(-1.0, -1.0, -3.0),
            max: Vec3::new(1.0, 1.0, -0.5),
        }
    }

    /// Check if a position lies inside the bounds (edges inclusive).
    #[inline]
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Clamp each component of `p` into the bounds.
    #[inline]
    #[must_use]
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        p.max(self.min).min(self.max)
    }
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::movement_volume()
    }
}

/// Component-wise clamp of `position` into `bounds`.
#[inline]
#[must_use]
pub fn clamp_to_bounds(position: Vec3, bounds: &Bounds3) -> Vec3 {
    bounds.clamp(position)
}

/// Placement of a connector between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorGeometry {
    /// Arithmetic mean of the endpoints.
    pub midpoint: Vec3,
    /// Euclidean distance between the endpoints.
    pub length: f32,
    /// Rotation taking [`REFERENCE_AXIS`] onto the endpoint direction.
    pub orientation: Quat,
}

impl ConnectorGeometry {
    /// Transform for a unit cylinder of radius 1 along [`REFERENCE_AXIS`].
    #[must_use]
    pub fn transform(&self, radius: f32) -> Transform {
        Transform {
            translation: self.midpoint,
            rotation: self.orientation,
            scale: Vec3::new(radius, self.length, radius),
        }
    }

    /// Check whether two geometries are equal within `epsilon`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.midpoint.abs_diff_eq(other.midpoint, epsilon)
            && (self.length - other.length).abs() <= epsilon
            && self.orientation.abs_diff_eq(other.orientation, epsilon)
    }

    /// The two endpoints this geometry spans.
    #[must_use]
    pub fn endpoints(&self) -> (Vec3, Vec3) {
        let half = self.orientation * REFERENCE_AXIS * (self.length * 0.5);
        (self.midpoint - half, self.midpoint + half)
    }
}

/// Compute connector geometry between two endpoints.
///
/// Returns `None` when the endpoints coincide within [`CONNECTOR_EPSILON`],
/// when either is non-finite, or when their distance exceeds `f32::MAX`;
/// the caller renders nothing in those cases.
#[must_use]
pub fn connector_geometry(from: Vec3, to: Vec3) -> Option<ConnectorGeometry> {
    // f64 so finite endpoints far apart neither overflow nor lose the midpoint.
    let from64 = from.as_dvec3();
    let delta = to.as_dvec3() - from64;
    let length64 = delta.length();
    let length = length64 as f32;
    if !length.is_finite() || length < CONNECTOR_EPSILON {
        return None;
    }

    let direction = (delta / length64).as_vec3();
    let dot = REFERENCE_AXIS.dot(direction).clamp(-1.0, 1.0);

    // Parallel and anti-parallel both map to identity; the cylinder is symmetric.
    let orientation = if dot.abs() >= 1.0 - PARALLEL_TOLERANCE {
        Quat::IDENTITY
    } else {
        let axis = REFERENCE_AXIS.cross(direction).normalize();
        Quat::from_axis_angle(axis, dot.acos())
    };

    Some(ConnectorGeometry {
        midpoint: (from64 + delta * 0.5).as_vec3(),
        length,
        orientation,
    })
}

/// Translation, rotation and scale of an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Transform placing an unrotated entity at `translation` with uniform `scale`.
    #[must_use]
    pub fn at(translation: Vec3, scale: f32) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(scale),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn clamp_keeps_inside_points() {
        let b = Bounds3::movement_volume();
        let p = Vec3::new(0.2, -0.4, -1.5);
        assert_eq!(clamp_to_bounds(p, &b), p);
    }

    #[test]
    fn clamp_limits_each_component() {
        let b = Bounds3::movement_volume();
        let p = clamp_to_bounds(Vec3::new(5.0, -7.0, 0.0), &b);
        assert_eq!(p, Vec3::new(1.0, -1.0, -0.5));
        let p = clamp_to_bounds(Vec3::new(-5.0, 7.0, -10.0), &b);
        assert_eq!(p, Vec3::new(-1.0, 1.0, -3.0));
    }

    #[test]
    fn bounds_new_orders_corners() {
        let b = Bounds3::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(b.max, Vec3::new(1.0, 2.0, 3.0));
        assert!(b.contains(Vec3::ZERO));
        assert!(b.contains(b.max));
        assert!(!b.contains(Vec3::new(1.5, 0.0, 0.0)));
    }

    #[test]
    fn connector_midpoint_and_length() {
        let g = connector_geometry(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)).unwrap();
        assert!(g.midpoint.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPS));
        assert!((g.length - 2.0).abs() < EPS);
    }

    #[test]
    fn connector_between_far_endpoints() {
        let g = connector_geometry(Vec3::new(3e38, 0.0, 0.0), Vec3::new(2e38, 0.0, 0.0));
        let g = g.unwrap();
        assert!(g.midpoint.abs_diff_eq(Vec3::new(2.5e38, 0.0, 0.0), 1e32));
        assert!((g.length - 1e38).abs() < 1e32);
        assert!((g.orientation * REFERENCE_AXIS).abs_diff_eq(Vec3::NEG_X, EPS));

        // Distance beyond f32 range has no representable length.
        assert!(connector_geometry(Vec3::splat(-3e38), Vec3::splat(3e38)).is_none());
    }

    #[test]
    fn connector_orientation_maps_reference_axis_onto_direction() {
        let from = Vec3::new(-0.42, 1.5, -1.5);
        let to = Vec3::new(-0.05, 1.43, -1.5);
        let g = connector_geometry(from, to).unwrap();
        let rotated = g.orientation * REFERENCE_AXIS;
        assert!(rotated.abs_diff_eq((to - from).normalize(), 1e-4));
    }

    #[test]
    fn coincident_endpoints_produce_no_geometry() {
        let p = Vec3::new(0.3, 0.3, -1.0);
        assert!(connector_geometry(p, p).is_none());
        assert!(connector_geometry(p, p + Vec3::splat(1e-6)).is_none());
    }

    #[test]
    fn parallel_to_reference_axis_is_identity() {
        let g = connector_geometry(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0)).unwrap();
        assert_eq!(g.orientation, Quat::IDENTITY);
        let g = connector_geometry(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO).unwrap();
        assert_eq!(g.orientation, Quat::IDENTITY);
    }

    #[test]
    fn endpoints_round_trip_through_geometry() {
        let from = Vec3::new(0.1, 0.2, -1.0);
        let to = Vec3::new(0.6, -0.3, -2.0);
        let g = connector_geometry(from, to).unwrap();
        let (a, b) = g.endpoints();
        assert!(a.abs_diff_eq(from, 1e-4));
        assert!(b.abs_diff_eq(to, 1e-4));
    }

    #[test]
    fn connector_transform_scales_along_axis() {
        let g = connector_geometry(Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0)).unwrap();
        let t = g.transform(0.005);
        assert_eq!(t.scale, Vec3::new(0.005, 2.0, 0.005));
        assert_eq!(t.translation, g.midpoint);
    }

    #[test]
    fn transform_at_is_uniform() {
        let t = Transform::at(Vec3::X, 1.2);
        assert_eq!(t.scale, Vec3::splat(1.2));
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(Transform::default(), Transform::IDENTITY);
    }
}
