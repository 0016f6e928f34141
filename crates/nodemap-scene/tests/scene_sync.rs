//! Scene synchronization behavior against a recording surface.
//!
//! ```sh
//! cargo test -p nodemap-scene --test scene_sync
//! ```

use nodemap_core::Vec3;
use nodemap_core::event::{EntityHandle, GestureEvent};
use nodemap_core::id::NodeId;
use nodemap_graph::{Connection, GraphStore, Node};
use nodemap_scene::{
    DragPhase, HeadlessSurface, SceneSession, SceneSyncEngine, SelectionState, SurfaceCall,
};

// ============================================================================
// Helpers
// ============================================================================

fn pair() -> (GraphStore, NodeId, NodeId) {
    let mut store = GraphStore::new();
    let a = store.add_node("a", "first", Some(Vec3::new(0.0, 0.0, -1.5)));
    let b = store.add_node("b", "", Some(Vec3::new(0.5, 0.0, -1.5)));
    store.add_connection(&a, &b);
    (store, a, b)
}

fn attached(store: &mut GraphStore) -> SceneSyncEngine<HeadlessSurface> {
    let mut engine = SceneSyncEngine::new(HeadlessSurface::new());
    engine.attach(store);
    engine.surface_mut().take_calls();
    engine
}

fn handle_of(engine: &SceneSyncEngine<HeadlessSurface>, id: &NodeId) -> EntityHandle {
    engine.registry().node(id).map(|e| e.handle).unwrap()
}

fn appearance_calls(calls: &[SurfaceCall]) -> Vec<(EntityHandle, bool)> {
    calls
        .iter()
        .filter_map(|c| match c {
            SurfaceCall::SetAppearance { handle, appearance } => {
                Some((*handle, appearance.selected))
            }
            _ => None,
        })
        .collect()
}

// ============================================================================
// 1. Reconciliation
// ============================================================================

#[test]
fn reconcile_is_idempotent() {
    let store = GraphStore::sample();
    let mut engine = SceneSyncEngine::new(HeadlessSurface::new());

    let first = engine.reconcile(&store);
    assert_eq!(first.created, 6);
    engine.surface_mut().take_calls();

    let second = engine.reconcile(&store);
    assert!(second.is_noop(), "{second:?}");
    assert!(engine.surface().calls().is_empty());
}

#[test]
fn external_removal_destroys_entities() {
    let (mut store, a, _) = pair();
    let mut engine = attached(&mut store);
    let ha = handle_of(&engine, &a);

    store.remove_node(&a);
    let report = engine.sync(&store);
    assert_eq!(report.removed, 2);
    assert!(engine.surface().entity(ha).is_none());
    assert_eq!(engine.registry().connector_count(), 0);
}

#[test]
fn connection_with_missing_endpoint_is_skipped() {
    let (store, _, _) = pair();
    let mut engine = SceneSyncEngine::new(HeadlessSurface::new());
    engine.reconcile_nodes(store.nodes());

    let dangling = [Connection::new("x", "a-missing", store.nodes()[0].id().clone())];
    let report = engine.reconcile_connections(&dangling, store.nodes());
    assert_eq!(report.skipped, 1);
    assert_eq!(report.created, 0);
    assert_eq!(engine.registry().connector_count(), 0);
}

#[test]
fn coincident_endpoints_render_no_connector() {
    let nodes = vec![
        Node::new("a", "a", "", Vec3::new(0.0, 0.0, -1.0)),
        Node::new("b", "b", "", Vec3::new(0.0, 0.0, -1.0)),
    ];
    let connections = vec![Connection::new("c", "a", "b")];
    let mut store = GraphStore::with_nodes_and_connections(nodes, connections);
    let mut engine = attached(&mut store);
    assert_eq!(engine.registry().connector_count(), 0);

    store.update_position(&NodeId::new("b"), Vec3::new(0.3, 0.0, -1.0));
    engine.sync(&store);
    assert_eq!(engine.registry().connector_count(), 1);

    store.update_position(&NodeId::new("b"), Vec3::new(0.0, 0.0, -1.0));
    engine.sync(&store);
    assert_eq!(engine.registry().connector_count(), 0);
    assert_eq!(engine.surface().connector_entity_count(), 0);
}

// ============================================================================
// 2. Selection
// ============================================================================

#[test]
fn switching_selection_deselects_before_selecting() {
    let (mut store, a, b) = pair();
    let mut engine = attached(&mut store);
    let (ha, hb) = (handle_of(&engine, &a), handle_of(&engine, &b));

    engine.handle_tap(&store, &a);
    assert_eq!(
        appearance_calls(&engine.surface_mut().take_calls()),
        vec![(ha, true)]
    );

    engine.handle_tap(&store, &b);
    assert_eq!(
        appearance_calls(&engine.surface_mut().take_calls()),
        vec![(ha, false), (hb, true)]
    );
}

#[test]
fn tapping_twice_clears_selection() {
    let (mut store, a, _) = pair();
    let mut engine = attached(&mut store);
    let ha = handle_of(&engine, &a);

    engine.handle_gesture(&mut store, GestureEvent::Tap { handle: ha });
    assert_eq!(engine.selection().selected(), Some(&a));
    let expanded = engine.registry().node(&a).map(|e| e.appearance.expanded);
    assert_eq!(expanded, Some(true));

    engine.handle_gesture(&mut store, GestureEvent::Tap { handle: ha });
    assert_eq!(engine.selection().state(), &SelectionState::Unselected);
    let scale = engine.surface().entity(ha).map(|e| e.transform.scale);
    assert_eq!(scale, Some(Vec3::ONE));
}

#[test]
fn removing_selected_node_emits_no_appearance_update() {
    let (store, a, _) = pair();
    let mut session = SceneSession::new(store, HeadlessSurface::new());
    session.tap(&a);
    session.surface_mut().take_calls();

    session.remove_node(&a);
    let calls = session.surface_mut().take_calls();
    assert!(appearance_calls(&calls).is_empty());
    assert!(calls.iter().all(SurfaceCall::is_structural));
    assert_eq!(session.engine().selection().selected(), None);
}

#[test]
fn taps_on_connectors_are_ignored() {
    let (mut store, _, _) = pair();
    let mut engine = attached(&mut store);
    let connector = store.connections()[0].id().clone();
    let handle = engine.registry().connector(&connector).map(|e| e.handle).unwrap();

    engine.handle_gesture(&mut store, GestureEvent::Tap { handle });
    assert_eq!(engine.selection().selected(), None);
    assert!(engine.surface().calls().is_empty());
}

// ============================================================================
// 3. Dragging
// ============================================================================

#[test]
fn drag_moves_node_and_connector() {
    let (mut store, a, _) = pair();
    let mut engine = attached(&mut store);
    let ha = handle_of(&engine, &a);
    let conn = store.connections()[0].id().clone();

    engine.handle_gesture(&mut store, GestureEvent::DragStart { handle: ha });
    let scale = engine.surface().entity(ha).map(|e| e.transform.scale);
    assert_eq!(scale, Some(Vec3::splat(1.1)));

    let translation = Vec3::new(0.2, 0.1, 0.0);
    for _ in 0..3 {
        engine.handle_gesture(&mut store, GestureEvent::DragUpdate { handle: ha, translation });
    }
    assert_eq!(
        store.node(&a).map(|n| n.position),
        Some(Vec3::new(0.2, 0.1, -1.5))
    );
    let midpoint = engine.registry().connector(&conn).map(|e| e.geometry.midpoint);
    assert!(midpoint.is_some_and(|m| m.abs_diff_eq(Vec3::new(0.35, 0.05, -1.5), 1e-5)));

    engine.handle_gesture(&mut store, GestureEvent::DragEnd { handle: ha });
    assert!(engine.drag_session().is_none());
    let scale = engine.surface().entity(ha).map(|e| e.transform.scale);
    assert_eq!(scale, Some(Vec3::ONE));

    // The store changes the drag wrote are already rendered.
    engine.surface_mut().take_calls();
    assert!(engine.sync(&store).is_noop());
    assert!(engine.surface().calls().is_empty());
}

#[test]
fn drag_leaves_unrelated_connectors_alone() {
    let (mut store, a, b) = pair();
    let c = store.add_node("c", "", Some(Vec3::new(0.5, 0.5, -1.5)));
    let far = store.add_connection(&b, &c).unwrap();
    let mut engine = attached(&mut store);
    let far_handle = engine.registry().connector(&far).map(|e| e.handle).unwrap();
    let ha = handle_of(&engine, &a);

    engine.handle_gesture(&mut store, GestureEvent::DragStart { handle: ha });
    for step in 1..=3 {
        let translation = Vec3::new(0.1 * step as f32, 0.0, 0.0);
        engine.handle_gesture(&mut store, GestureEvent::DragUpdate { handle: ha, translation });
    }
    engine.handle_gesture(&mut store, GestureEvent::DragEnd { handle: ha });
    engine.sync(&store);

    let calls = engine.surface_mut().take_calls();
    assert!(calls.iter().any(|c| matches!(c, SurfaceCall::UpdateTransform { .. })));
    assert!(calls.iter().all(|c| c.handle() != far_handle), "{calls:?}");
}

#[test]
fn drag_is_clamped_to_movement_volume() {
    let (mut store, a, _) = pair();
    let mut engine = attached(&mut store);

    engine.apply_drag(&mut store, &a, DragPhase::Started);
    engine.apply_drag(&mut store, &a, DragPhase::Changed(Vec3::new(5.0, 5.0, 5.0)));
    assert_eq!(
        store.node(&a).map(|n| n.position),
        Some(Vec3::new(1.0, 1.0, -0.5))
    );
    engine.apply_drag(&mut store, &a, DragPhase::Changed(Vec3::new(-5.0, -5.0, -5.0)));
    assert_eq!(
        store.node(&a).map(|n| n.position),
        Some(Vec3::new(-1.0, -1.0, -3.0))
    );
}

#[test]
fn update_without_start_starts_implicitly() {
    let (mut store, a, _) = pair();
    let mut engine = attached(&mut store);

    engine.apply_drag(&mut store, &a, DragPhase::Changed(Vec3::new(0.1, 0.0, 0.0)));
    assert_eq!(engine.drag_session().map(|s| s.node()), Some(&a));
    assert_eq!(
        store.node(&a).map(|n| n.position),
        Some(Vec3::new(0.1, 0.0, -1.5))
    );
}

#[test]
fn second_drag_is_ignored_while_one_is_active() {
    let (mut store, a, b) = pair();
    let mut engine = attached(&mut store);
    let before = store.node(&b).map(|n| n.position);

    engine.apply_drag(&mut store, &a, DragPhase::Started);
    engine.apply_drag(&mut store, &b, DragPhase::Started);
    engine.apply_drag(&mut store, &b, DragPhase::Changed(Vec3::new(0.1, 0.1, 0.0)));
    engine.apply_drag(&mut store, &b, DragPhase::Ended);

    assert_eq!(store.node(&b).map(|n| n.position), before);
    assert_eq!(engine.drag_session().map(|s| s.node()), Some(&a));
}

#[test]
fn selected_node_rests_at_selected_scale_after_drag() {
    let (mut store, a, _) = pair();
    let mut engine = attached(&mut store);
    let ha = handle_of(&engine, &a);

    engine.handle_tap(&store, &a);
    engine.apply_drag(&mut store, &a, DragPhase::Started);
    engine.apply_drag(&mut store, &a, DragPhase::Ended);
    let scale = engine.surface().entity(ha).map(|e| e.transform.scale);
    assert_eq!(scale, Some(Vec3::splat(1.2)));
}

// ============================================================================
// 4. Change feed
// ============================================================================

#[test]
fn edit_refreshes_exactly_one_appearance() {
    let (mut store, a, _) = pair();
    let mut engine = attached(&mut store);
    let ha = handle_of(&engine, &a);

    store.update_node(&a, "renamed", "first");
    engine.sync(&store);
    let calls = engine.surface_mut().take_calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        SurfaceCall::SetAppearance { handle, appearance } => {
            assert_eq!(*handle, ha);
            assert_eq!(appearance.label_text, "renamed");
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[test]
fn session_keeps_scene_in_step() {
    let mut session = SceneSession::new(GraphStore::new(), HeadlessSurface::new());
    let a = session.add_node("a", "", Some(Vec3::new(0.0, 0.0, -1.0)));
    let b = session.add_node("b", "", Some(Vec3::new(0.5, 0.5, -1.0)));
    assert_eq!(session.surface().node_entity_count(), 2);

    let c = session.add_connection(&a, &b);
    assert!(c.is_some());
    assert!(session.add_connection(&b, &a).is_none());
    assert_eq!(session.surface().connector_entity_count(), 1);

    assert_eq!(session.remove_connections_between(&b, &a), 1);
    assert_eq!(session.surface().connector_entity_count(), 0);

    session.update_position(&b, Vec3::new(0.2, 0.2, -1.0));
    let hb = session.engine().registry().node(&b).map(|e| e.handle).unwrap();
    let at = session.surface().entity(hb).map(|e| e.transform.translation);
    assert_eq!(at, Some(Vec3::new(0.2, 0.2, -1.0)));

    let (store, surface) = session.into_parts();
    assert_eq!(store.nodes().len(), 2);
    assert_eq!(surface.node_entity_count(), 2);
}

#[test]
fn reload_from_backend_is_reconciled() {
    use nodemap_graph::{
        GraphSnapshot, MemoryBackend, PersistenceBackend, PersistenceResult, Record, RecordKey,
    };

    /// Backend that always adds one extra node on read.
    struct Seeding(MemoryBackend);

    impl PersistenceBackend for Seeding {
        fn name(&self) -> &str {
            "Seeding"
        }
        fn load_all(&self) -> PersistenceResult<GraphSnapshot> {
            let mut snapshot = self.0.load_all()?;
            if !snapshot.nodes.iter().any(|n| n.id().as_str() == "seed") {
                snapshot
                    .nodes
                    .push(Node::new("seed", "seed", "", Vec3::new(0.0, 0.0, -2.0)));
            }
            Ok(snapshot)
        }
        fn save(&self, record: Record<'_>) -> PersistenceResult<()> {
            self.0.save(record)
        }
        fn delete(&self, key: &RecordKey) -> PersistenceResult<()> {
            self.0.delete(key)
        }
    }

    let store = GraphStore::with_backend(Seeding(MemoryBackend::new()));
    let mut session = SceneSession::new(store, HeadlessSurface::new());
    assert_eq!(session.surface().node_entity_count(), 1);

    session.add_node("a", "", None);
    assert_eq!(session.store().nodes().len(), 2);
    assert_eq!(session.surface().node_entity_count(), 2);
}
