use super::*;
use crate::foundation::core::TileCoord;

fn small() -> GridGeometry {
    GridGeometry::new(30, 10).unwrap()
}

fn sample_state() -> CanvasState {
    let mut state = CanvasState::new(small());
    for (owner, coord) in [("42", (0, 0)), ("42", (10, 0)), ("7", (20, 0))] {
        let coord = TileCoord::new(coord.0, coord.1);
        state
            .grid
            .set(
                coord,
                CellState::Claimed {
                    owner: owner.to_string(),
                },
            )
            .unwrap();
        state.claims.push(owner, coord);
    }
    state
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_store").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn capture_restore_preserves_state() {
    let state = sample_state();
    let snap = Snapshot::capture(&state);
    assert_eq!(snap.cells.len(), 3);
    assert_eq!(snap.cells[0][1].as_deref(), Some("42"));
    assert_eq!(snap.restore(small()).unwrap(), state);
}

#[test]
fn snapshot_json_shape() {
    let snap = Snapshot::capture(&sample_state());
    let v: serde_json::Value = serde_json::from_slice(&snap.to_json_bytes().unwrap()).unwrap();
    assert_eq!(v["version"], 1);
    assert_eq!(v["grid_size"], 30);
    assert_eq!(v["claims"]["42"], serde_json::json!([[0, 0], [10, 0]]));
    assert_eq!(v["cells"][1][0], serde_json::Value::Null);
}

#[test]
fn restore_rejects_geometry_mismatch_and_bad_version() {
    let snap = Snapshot::capture(&sample_state());
    let err = snap
        .clone()
        .restore(GridGeometry::default())
        .unwrap_err();
    assert!(err.is_persistence());

    let mut bad = snap;
    bad.version = 99;
    assert!(bad.restore(small()).unwrap_err().is_persistence());
}

#[test]
fn restore_rejects_inconsistent_pair() {
    let mut snap = Snapshot::capture(&sample_state());
    snap.cells[2][2] = Some("ghost".to_string());
    let err = snap.restore(small()).unwrap_err();
    assert!(err.is_persistence());
    assert!(err.to_string().contains("inconsistent snapshot"));
}

#[test]
fn fs_store_missing_file_is_none() {
    let dir = scratch_dir("missing");
    let mut store = FsGridStore::new(dir.join("canvas.json"));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn fs_store_save_then_load() {
    let dir = scratch_dir("roundtrip");
    let path = dir.join("nested").join("canvas.json");
    let mut store = FsGridStore::new(&path);
    let snap = Snapshot::capture(&sample_state());
    store.save(&snap).unwrap();
    assert!(path.exists());
    assert_eq!(store.load().unwrap(), Some(snap));

    let leftovers: Vec<_> = std::fs::read_dir(dir.join("nested"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}

#[test]
fn fs_store_temp_names_are_unique() {
    let store = FsGridStore::new("target/unit_store/unique/canvas.json");
    assert_ne!(store.temp_path(), store.temp_path());
}

#[test]
fn fs_store_lock_excludes_other_handles() {
    let dir = scratch_dir("lock");
    let path = dir.join("canvas.json");
    let mut a = FsGridStore::new(&path);
    assert!(a.lock().unwrap().is_none());

    let other = File::open(a.lock_path()).unwrap();
    assert!(matches!(
        other.try_lock(),
        Err(std::fs::TryLockError::WouldBlock)
    ));

    a.unlock();
    other.try_lock().unwrap();
    other.unlock().unwrap();
}

#[test]
fn fs_store_lock_reports_foreign_writes_only() {
    let dir = scratch_dir("foreign");
    let path = dir.join("canvas.json");
    let mut a = FsGridStore::new(&path);
    let mut b = FsGridStore::new(&path);
    assert!(b.load().unwrap().is_none());

    let first = Snapshot::capture(&sample_state());
    a.save(&first).unwrap();
    assert_eq!(b.lock().unwrap(), Some(first.clone()));
    b.unlock();

    assert!(b.lock().unwrap().is_none());
    b.save(&first).unwrap();
    b.unlock();
    assert!(a.lock().unwrap().is_none());
    a.unlock();
}

#[test]
fn unparsable_file_is_not_reported_again_after_load() {
    let dir = scratch_dir("unparsable");
    let path = dir.join("canvas.json");
    std::fs::write(&path, b"garbage").unwrap();
    let mut store = FsGridStore::new(&path);
    assert!(store.load().is_err());
    assert!(store.lock().unwrap().is_none());
    store.unlock();
}

#[test]
fn fs_store_corrupt_file_is_persistence_error() {
    let dir = scratch_dir("corrupt");
    let path = dir.join("canvas.json");
    std::fs::write(&path, b"{ not json").unwrap();
    let mut store = FsGridStore::new(&path);
    assert!(store.load().unwrap_err().is_persistence());
}

#[test]
fn memory_store_shares_state_and_can_fail() {
    let store = MemoryGridStore::new();
    let mut handle: Box<dyn GridStore> = Box::new(store.clone());
    let snap = Snapshot::capture(&sample_state());

    handle.save(&snap).unwrap();
    assert_eq!(store.save_count(), 1);
    assert_eq!(store.snapshot(), Some(snap.clone()));

    store.set_fail_saves(true);
    assert!(handle.save(&snap).unwrap_err().is_persistence());
    assert_eq!(store.save_count(), 1);
}

#[test]
fn memory_store_lock_reports_saves_from_other_handles() {
    let mut a = MemoryGridStore::new();
    let mut b = a.clone();
    let snap = Snapshot::capture(&sample_state());

    assert!(a.lock().unwrap().is_none());
    a.save(&snap).unwrap();
    a.unlock();

    assert_eq!(b.lock().unwrap(), Some(snap));
    assert!(b.lock().unwrap().is_none());
    b.unlock();
}

#[test]
fn memory_store_lock_is_exclusive() {
    let mut a = MemoryGridStore::new();
    let mut b = a.clone();
    a.lock().unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let waiter = std::thread::spawn(move || {
        b.lock().unwrap();
        tx.send(()).unwrap();
        b.unlock();
    });
    assert!(rx.recv_timeout(std::time::Duration::from_millis(100)).is_err());

    a.unlock();
    rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
    waiter.join().unwrap();
}
