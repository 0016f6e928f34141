//! JSON file backend tests.
//!
//! ```sh
//! cargo test -p nodemap-graph --features file-storage --test file_backend
//! ```

use nodemap_core::Vec3;
use nodemap_core::id::NodeId;
use nodemap_graph::{
    FileBackend, GraphSnapshot, GraphStore, PersistenceBackend, PersistenceError, Record,
    RecordKey,
};
use tempfile::TempDir;

fn backend_in(dir: &TempDir) -> FileBackend {
    FileBackend::new(dir.path().join("graph.json"))
}

#[test]
fn missing_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let backend = backend_in(&dir);
    assert_eq!(backend.load_all().unwrap(), GraphSnapshot::default());
}

#[test]
fn store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let (a, b) = {
        let mut store = GraphStore::with_backend(backend_in(&dir));
        let a = store.add_node("alpha", "first", Some(Vec3::new(0.25, 1.5, -1.5)));
        let b = store.add_node("beta", "", None);
        store.add_connection(&a, &b);
        store.update_node(&b, "beta", "second");
        assert!(store.last_persistence_error().is_none());
        (a, b)
    };

    let store = GraphStore::with_backend(backend_in(&dir));
    assert_eq!(store.nodes().len(), 2);
    assert_eq!(
        store.node(&a).map(|n| n.position),
        Some(Vec3::new(0.25, 1.5, -1.5))
    );
    assert_eq!(store.node(&b).map(|n| n.detail.as_str()), Some("second"));
    assert!(store.has_connection(&a));
}

#[test]
fn writes_leave_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let backend = backend_in(&dir);
    let snapshot = GraphSnapshot::sample();
    for node in &snapshot.nodes {
        backend.save(Record::Node(node)).unwrap();
    }
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["graph.json".to_string()]);
}

#[test]
fn delete_removes_record() {
    let dir = TempDir::new().unwrap();
    let backend = backend_in(&dir);
    let snapshot = GraphSnapshot::sample();
    for node in &snapshot.nodes {
        backend.save(Record::Node(node)).unwrap();
    }
    for conn in &snapshot.connections {
        backend.save(Record::Connection(conn)).unwrap();
    }
    backend.delete(&RecordKey::Node(NodeId::new("0"))).unwrap();
    let hits = backend
        .query_connections(&|c| c.touches(&NodeId::new("2")))
        .unwrap();
    assert_eq!(hits.len(), 1);

    let loaded = backend.load_all().unwrap();
    assert_eq!(loaded.nodes.len(), 4);
    assert_eq!(loaded.connections.len(), 1);
}

#[test]
fn corrupt_file_is_a_serialization_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json");
    std::fs::write(&path, "{ not json").unwrap();
    let backend = FileBackend::new(&path);
    assert!(matches!(
        backend.load_all(),
        Err(PersistenceError::Serialization(_))
    ));

    let store = GraphStore::with_backend(FileBackend::new(&path));
    assert!(store.nodes().is_empty());
    assert!(store.last_persistence_error().is_some());
}

#[test]
fn version_mismatch_loads_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json");
    std::fs::write(
        &path,
        r#"{"format_version":99,"nodes":[{"id":"a","name":"a","position":[0,0,0]}],"connections":[]}"#,
    )
    .unwrap();
    let backend = FileBackend::new(&path);
    assert_eq!(backend.load_all().unwrap(), GraphSnapshot::default());
}

#[test]
fn detail_defaults_to_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json");
    std::fs::write(
        &path,
        r#"{"format_version":1,"nodes":[{"id":"a","name":"a","position":[1,2,3]}],"connections":[]}"#,
    )
    .unwrap();
    let loaded = FileBackend::new(&path).load_all().unwrap();
    assert_eq!(loaded.nodes.len(), 1);
    assert_eq!(loaded.nodes[0].detail, "");
    assert_eq!(loaded.nodes[0].position, Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn nested_directories_are_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a").join("b").join("graph.json");
    let mut store = GraphStore::with_backend(FileBackend::new(&path));
    store.add_node("deep", "", None);
    assert!(path.exists());
    assert!(store.last_persistence_error().is_none());
}
