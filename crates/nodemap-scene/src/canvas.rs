#![forbid(unsafe_code)]

//! Flat 2D projection surface.
//!
//! `CanvasSurface` shows the scene as seen along -Z: node entities become
//! label plates centered on their projected position, connectors become
//! segments between their projected endpoints. Plate centers and segment
//! endpoints are both clamped into the viewport's height band, so a clamped
//! plate still sits on the end of its segments.
//!
//! Hit testing returns the topmost plate under a point; plates created
//! later draw above earlier ones.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use nodemap_core::event::EntityHandle;
use nodemap_core::geometry::{REFERENCE_AXIS, Transform};
use nodemap_core::projection::{Viewport, world_to_view};
use nodemap_core::{Vec2, Vec3};
use nodemap_graph::{Connection, Node};

use crate::appearance::NodeAppearance;
use crate::registry::EntityTag;
use crate::surface::PresentationSurface;

/// A projected entity.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasShape {
    /// A node's label plate; `center` and `size` in view points.
    Plate {
        center: Vec2,
        size: Vec2,
        label: String,
        selected: bool,
    },
    /// A connector between two view points.
    Segment { from: Vec2, to: Vec2 },
}

impl CanvasShape {
    /// Check if a plate covers `point` (edges inclusive). Segments never do.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        match self {
            Self::Plate { center, size, .. } => {
                let half = *size * 0.5;
                let min = *center - half;
                let max = *center + half;
                point.cmpge(min).all() && point.cmple(max).all()
            }
            Self::Segment { .. } => false,
        }
    }
}

#[derive(Debug, Clone)]
struct CanvasEntity {
    tag: EntityTag,
    transform: Transform,
    appearance: Option<NodeAppearance>,
}

/// Orthographic 2D view of the scene.
#[derive(Debug)]
pub struct CanvasSurface {
    viewport: Viewport,
    next_handle: u64,
    entities: BTreeMap<EntityHandle, CanvasEntity>,
}

impl CanvasSurface {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            next_handle: 0,
            entities: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Replace the viewport; shapes are re-projected on the next query.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Projected shape of an entity.
    #[must_use]
    pub fn shape(&self, handle: EntityHandle) -> Option<CanvasShape> {
        self.entities.get(&handle).map(|e| self.project(e))
    }

    /// All projected shapes, bottom to top.
    pub fn shapes(&self) -> impl Iterator<Item = (EntityHandle, CanvasShape)> + '_ {
        self.entities.iter().map(|(h, e)| (*h, self.project(e)))
    }

    /// Topmost node entity whose plate covers `point`.
    #[must_use]
    pub fn hit_test(&self, point: Vec2) -> Option<EntityHandle> {
        self.entities
            .iter()
            .rev()
            .filter(|(_, e)| matches!(e.tag, EntityTag::Node(_)))
            .find(|(_, e)| self.project(e).contains(point))
            .map(|(h, _)| *h)
    }

    /// World translation for a drag from `start` to `current` in view points.
    #[must_use]
    pub fn drag_translation(&self, start: Vec2, current: Vec2) -> Vec3 {
        self.viewport.view_delta_to_world(current - start)
    }

    /// One line per entity, bottom to top.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (handle, shape) in self.shapes() {
            match shape {
                CanvasShape::Plate {
                    center,
                    size,
                    label,
                    selected,
                } => {
                    let _ = writeln!(
                        out,
                        "node {handle} \"{}\" at ({:.1}, {:.1}) size {:.1}x{:.1}{}",
                        label.replace('\n', " / "),
                        center.x,
                        center.y,
                        size.x,
                        size.y,
                        if selected { " [selected]" } else { "" }
                    );
                }
                CanvasShape::Segment { from, to } => {
                    let _ = writeln!(
                        out,
                        "link {handle} ({:.1}, {:.1}) -> ({:.1}, {:.1})",
                        from.x, from.y, to.x, to.y
                    );
                }
            }
        }
        out
    }

    fn project(&self, entity: &CanvasEntity) -> CanvasShape {
        let t = entity.transform;
        match &entity.appearance {
            Some(appearance) => {
                let ppm = self.viewport.points_per_meter;
                CanvasShape::Plate {
                    center: self
                        .viewport
                        .clamp_to_band(world_to_view(t.translation, &self.viewport)),
                    size: Vec2::new(
                        appearance.label_size.width * t.scale.x * ppm,
                        appearance.label_size.height * t.scale.y * ppm,
                    ),
                    label: appearance.label_text.clone(),
                    selected: appearance.selected,
                }
            }
            None => {
                let half = t.rotation * REFERENCE_AXIS * (t.scale.y * 0.5);
                let view = |p| {
                    self.viewport
                        .clamp_to_band(world_to_view(p, &self.viewport))
                };
                CanvasShape::Segment {
                    from: view(t.translation - half),
                    to: view(t.translation + half),
                }
            }
        }
    }

    fn allocate(&mut self) -> EntityHandle {
        self.next_handle += 1;
        EntityHandle::from_raw(self.next_handle)
    }
}

impl Default for CanvasSurface {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl PresentationSurface for CanvasSurface {
    fn create_node_entity(
        &mut self,
        node: &Node,
        appearance: &NodeAppearance,
        transform: Transform,
    ) -> EntityHandle {
        let handle = self.allocate();
        self.entities.insert(
            handle,
            CanvasEntity {
                tag: EntityTag::Node(node.id().clone()),
                transform,
                appearance: Some(appearance.clone()),
            },
        );
        handle
    }

    fn create_connector_entity(
        &mut self,
        connection: &Connection,
        transform: Transform,
    ) -> EntityHandle {
        let handle = self.allocate();
        self.entities.insert(
            handle,
            CanvasEntity {
                tag: EntityTag::Connection(connection.id().clone()),
                transform,
                appearance: None,
            },
        );
        handle
    }

    fn update_entity_transform(&mut self, handle: EntityHandle, transform: Transform) {
        if let Some(entity) = self.entities.get_mut(&handle) {
            entity.transform = transform;
        }
    }

    fn remove_entity(&mut self, handle: EntityHandle) {
        self.entities.remove(&handle);
    }

    fn set_entity_appearance(&mut self, handle: EntityHandle, appearance: &NodeAppearance) {
        if let Some(entity) = self.entities.get_mut(&handle) {
            entity.appearance = Some(appearance.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use nodemap_core::geometry::connector_geometry;

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0, 100.0)
    }

    fn plate(surface: &mut CanvasSurface, id: &str, at: Vec3) -> EntityHandle {
        let node = Node::new(id, "abcdefghij", "", at);
        let appearance = NodeAppearance::for_node(&node, false, &SceneConfig::default());
        surface.create_node_entity(&node, &appearance, Transform::at(at, 1.0))
    }

    #[test]
    fn plate_is_centered_on_projection() {
        let mut surface = CanvasSurface::new(viewport());
        let h = plate(&mut surface, "a", Vec3::new(1.0, 1.0, -1.5));
        match surface.shape(h) {
            Some(CanvasShape::Plate { center, .. }) => {
                assert_eq!(center, Vec2::new(500.0, 200.0));
            }
            other => panic!("expected plate, got {other:?}"),
        }
    }

    #[test]
    fn later_plates_win_hit_tests() {
        let mut surface = CanvasSurface::new(viewport());
        let below = plate(&mut surface, "a", Vec3::ZERO);
        let above = plate(&mut surface, "b", Vec3::ZERO);
        assert_eq!(surface.hit_test(Vec2::new(400.0, 300.0)), Some(above));
        surface.remove_entity(above);
        assert_eq!(surface.hit_test(Vec2::new(400.0, 300.0)), Some(below));
        assert_eq!(surface.hit_test(Vec2::new(0.0, 0.0)), None);
    }

    #[test]
    fn connectors_project_to_segments_and_never_hit() {
        let mut surface = CanvasSurface::new(viewport());
        let from = Vec3::new(-1.0, 0.0, -1.5);
        let to = Vec3::new(1.0, 0.0, -1.5);
        let g = connector_geometry(from, to).unwrap();
        let conn = Connection::new("c", "a", "b");
        let h = surface.create_connector_entity(&conn, g.transform(0.002));
        match surface.shape(h) {
            Some(CanvasShape::Segment { from: a, to: b }) => {
                let ends = [a, b];
                assert!(ends.iter().any(|p| p.abs_diff_eq(Vec2::new(300.0, 300.0), 1e-3)));
                assert!(ends.iter().any(|p| p.abs_diff_eq(Vec2::new(500.0, 300.0), 1e-3)));
            }
            other => panic!("expected segment, got {other:?}"),
        }
        assert_eq!(surface.hit_test(Vec2::new(400.0, 300.0)), None);
    }

    #[test]
    fn plates_are_clamped_into_the_band() {
        let mut surface = CanvasSurface::new(viewport().with_max_height(400.0));
        let h = plate(&mut surface, "low", Vec3::new(0.0, -2.5, -1.5));
        match surface.shape(h) {
            Some(CanvasShape::Plate { center, .. }) => assert_eq!(center.y, 400.0),
            other => panic!("expected plate, got {other:?}"),
        }
    }

    #[test]
    fn segments_end_on_clamped_plates() {
        let mut surface = CanvasSurface::new(viewport().with_max_height(400.0));
        let low = Vec3::new(0.0, -2.5, -1.5);
        let high = Vec3::new(0.0, 0.0, -1.5);
        let h = plate(&mut surface, "low", low);
        let g = connector_geometry(low, high).unwrap();
        let c = surface.create_connector_entity(&Connection::new("c", "low", "high"), g.transform(0.002));

        let Some(CanvasShape::Plate { center, .. }) = surface.shape(h) else {
            panic!("expected plate");
        };
        match surface.shape(c) {
            Some(CanvasShape::Segment { from, to }) => {
                let ends = [from, to];
                assert!(ends.iter().all(|p| p.y <= 400.0));
                assert!(ends.iter().any(|p| p.abs_diff_eq(center, 1e-2)));
            }
            other => panic!("expected segment, got {other:?}"),
        }
    }

    #[test]
    fn drag_translation_flips_y() {
        let surface = CanvasSurface::new(viewport());
        let t = surface.drag_translation(Vec2::new(400.0, 300.0), Vec2::new(450.0, 250.0));
        assert!(t.abs_diff_eq(Vec3::new(0.5, 0.5, 0.0), 1e-6));
    }

    #[test]
    fn dump_lists_every_entity() {
        let mut surface = CanvasSurface::new(viewport());
        plate(&mut surface, "a", Vec3::ZERO);
        let dump = surface.dump();
        assert!(dump.starts_with("node #1 \"abcdefghij\" at (400.0, 300.0)"));
        assert_eq!(dump.lines().count(), 1);
    }
}
