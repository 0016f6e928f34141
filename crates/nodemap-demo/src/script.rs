#![forbid(unsafe_code)]

//! Scripted interaction with a canvas-backed session.
//!
//! Actions name nodes by label. Taps and drags are resolved the way a
//! pointer would resolve them: the plate center of the named node is hit
//! tested on the canvas, and whatever plate is on top receives the gesture.

use nodemap::core::projection::view_to_world;
use nodemap::{CanvasShape, CanvasSurface, EntityHandle, GestureEvent, NodeId, SceneSession, Vec2};
use tracing::{debug, info};

/// One scripted step.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Tap the plate of the named node.
    Tap(String),
    /// Drag the named node's plate by `by` view points in `steps` updates.
    Drag { name: String, by: Vec2, steps: u32 },
    /// Add a node at a view point, unless one with this name exists.
    Add {
        name: String,
        detail: String,
        at: Vec2,
    },
    Connect(String, String),
    Disconnect(String, String),
    Rename { from: String, to: String },
}

/// Printable state after one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub caption: String,
    pub dump: String,
}

/// The script the binary plays against the sample graph.
#[must_use]
pub fn default_script() -> Vec<Action> {
    vec![
        Action::Tap("very long center node".into()),
        Action::Drag {
            name: "node one".into(),
            by: Vec2::new(-90.0, 120.0),
            steps: 4,
        },
        Action::Add {
            name: "new idea".into(),
            detail: "added by the script".into(),
            at: Vec2::new(520.0, 420.0),
        },
        Action::Connect("new idea".into(), "test node".into()),
        Action::Tap("new idea".into()),
        Action::Rename {
            from: "node two".into(),
            to: "node 2".into(),
        },
        Action::Disconnect("node one".into(), "node 2".into()),
        Action::Tap("new idea".into()),
    ]
}

/// Play `actions`, returning the initial frame and one frame per action.
pub fn play(session: &mut SceneSession<CanvasSurface>, actions: &[Action]) -> Vec<Frame> {
    let mut frames = vec![capture(session, "initial".to_owned())];
    for action in actions {
        let caption = perform(session, action);
        frames.push(capture(session, caption));
    }
    frames
}

fn capture(session: &SceneSession<CanvasSurface>, caption: String) -> Frame {
    Frame {
        caption,
        dump: session.surface().dump(),
    }
}

fn perform(session: &mut SceneSession<CanvasSurface>, action: &Action) -> String {
    match action {
        Action::Tap(name) => match pointer_target(session, name) {
            Some((handle, _)) => {
                session.handle_gesture(GestureEvent::Tap { handle });
                let selected = session
                    .engine()
                    .selection()
                    .selected()
                    .and_then(|id| session.store().node(id))
                    .map_or_else(|| "nothing".to_owned(), |n| format!("{:?}", n.name));
                format!("tap {name:?}: selected {selected}")
            }
            None => miss(name),
        },
        Action::Drag { name, by, steps } => {
            let Some((handle, start)) = pointer_target(session, name) else {
                return miss(name);
            };
            let steps = (*steps).max(1);
            session.handle_gesture(GestureEvent::DragStart { handle });
            for i in 1..=steps {
                let current = start + *by * (i as f32 / steps as f32);
                let translation = session.surface().drag_translation(start, current);
                session.handle_gesture(GestureEvent::DragUpdate {
                    handle,
                    translation,
                });
            }
            session.handle_gesture(GestureEvent::DragEnd { handle });
            let moved = session.engine().registry().node_for_handle(handle).cloned();
            let at = moved
                .as_ref()
                .and_then(|id| session.store().node(id))
                .map(|n| n.position_description())
                .unwrap_or_default();
            format!("drag {name:?} by ({:.0}, {:.0}): now at {at}", by.x, by.y)
        }
        Action::Add { name, detail, at } => {
            if find(session, name).is_some() {
                return format!("add {name:?}: already present");
            }
            let position = view_to_world(*at, session.surface().viewport());
            session.add_node(name.clone(), detail.clone(), Some(position));
            format!("add {name:?}")
        }
        Action::Connect(a, b) => match (find(session, a), find(session, b)) {
            (Some(from), Some(to)) => match session.add_connection(&from, &to) {
                Some(_) => format!("connect {a:?} -> {b:?}"),
                None => format!("connect {a:?} -> {b:?}: rejected"),
            },
            _ => format!("connect {a:?} -> {b:?}: unknown node"),
        },
        Action::Disconnect(a, b) => match (find(session, a), find(session, b)) {
            (Some(x), Some(y)) => {
                let removed = session.remove_connections_between(&x, &y);
                format!("disconnect {a:?} / {b:?}: {removed} removed")
            }
            _ => format!("disconnect {a:?} / {b:?}: unknown node"),
        },
        Action::Rename { from, to } => match find(session, from) {
            Some(id) => {
                let detail = session
                    .store()
                    .node(&id)
                    .map(|n| n.detail.clone())
                    .unwrap_or_default();
                session.update_node(&id, to.clone(), detail);
                format!("rename {from:?} -> {to:?}")
            }
            None => miss(from),
        },
    }
}

fn miss(name: &str) -> String {
    info!(name, "script target not found");
    format!("{name:?}: no such node")
}

fn find(session: &SceneSession<CanvasSurface>, name: &str) -> Option<NodeId> {
    session
        .store()
        .nodes()
        .iter()
        .find(|n| n.name == name)
        .map(|n| n.id().clone())
}

/// Resolve a node name to the entity a pointer at its plate center hits.
fn pointer_target(
    session: &SceneSession<CanvasSurface>,
    name: &str,
) -> Option<(EntityHandle, Vec2)> {
    let id = find(session, name)?;
    let handle = session.engine().registry().node(&id)?.handle;
    let CanvasShape::Plate { center, .. } = session.surface().shape(handle)? else {
        return None;
    };
    let hit = session.surface().hit_test(center)?;
    if hit != handle {
        debug!(name, %handle, %hit, "plate covered by another node");
    }
    Some((hit, center))
}
