use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::foundation::core::GridGeometry;
use crate::foundation::error::{PixelFrameError, PixelFrameResult};
use crate::grid::model::{CanvasState, CellState, ClaimIndex, Grid};

/// Current on-disk snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Persisted form of a [`CanvasState`].
///
/// The grid and the claim index live in one document so they are always written as a unit.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Snapshot {
    /// Format version, currently [`SNAPSHOT_VERSION`].
    pub version: u32,
    /// Grid side length in grid units.
    pub grid_size: u32,
    /// Tile side length in grid units.
    pub token_size: u32,
    /// Lattice rows (top to bottom); each entry is the owner or `null`.
    pub cells: Vec<Vec<Option<String>>>,
    /// Owner to claims mapping.
    pub claims: ClaimIndex,
}

impl Snapshot {
    /// Capture the current state.
    pub fn capture(state: &CanvasState) -> Self {
        let geometry = state.grid.geometry();
        let side = geometry.lattice_side() as usize;
        let cells = state
            .grid
            .cells()
            .chunks(side)
            .map(|row| row.iter().map(|c| c.owner().map(str::to_string)).collect())
            .collect();
        Self {
            version: SNAPSHOT_VERSION,
            grid_size: geometry.grid_size(),
            token_size: geometry.token_size(),
            cells,
            claims: state.claims.clone(),
        }
    }

    /// Rebuild a state, checking version, geometry and grid/index consistency.
    pub fn restore(self, expected: GridGeometry) -> PixelFrameResult<CanvasState> {
        if self.version != SNAPSHOT_VERSION {
            return Err(PixelFrameError::persistence(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            )));
        }
        let geometry = GridGeometry::new(self.grid_size, self.token_size)
            .map_err(|e| PixelFrameError::persistence(format!("snapshot geometry: {e}")))?;
        if geometry != expected {
            return Err(PixelFrameError::persistence(format!(
                "snapshot geometry {}/{} does not match configured {}/{}",
                geometry.grid_size(),
                geometry.token_size(),
                expected.grid_size(),
                expected.token_size()
            )));
        }

        let side = geometry.lattice_side() as usize;
        if self.cells.len() != side || self.cells.iter().any(|row| row.len() != side) {
            return Err(PixelFrameError::persistence(format!(
                "snapshot grid must be {side}x{side} cells"
            )));
        }

        let mut grid = Grid::new(geometry);
        for (coord, owner) in geometry.anchors().zip(self.cells.into_iter().flatten()) {
            if let Some(owner) = owner {
                grid.set(coord, CellState::Claimed { owner })?;
            }
        }

        let state = CanvasState {
            grid,
            claims: self.claims,
        };
        state
            .verify_consistency()
            .map_err(|e| PixelFrameError::persistence(format!("inconsistent snapshot: {e}")))?;
        Ok(state)
    }

    /// Serialize to JSON bytes.
    pub fn to_json_bytes(&self) -> PixelFrameResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| PixelFrameError::serde(e.to_string()))
    }

    /// Parse from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> PixelFrameResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| PixelFrameError::persistence(format!("parse snapshot JSON: {e}")))
    }
}

/// What to do when a snapshot exists but cannot be used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotRecovery {
    /// Refuse to start.
    #[default]
    Fail,
    /// Log a warning and start from an empty canvas.
    StartEmpty,
}

/// Key-value style persistence for canvas snapshots.
///
/// Writers bracket every read-modify-write with [`GridStore::lock`] and
/// [`GridStore::unlock`], so several handles (or processes) on the same storage never
/// interleave claims.
pub trait GridStore: Send {
    /// Read the stored snapshot; `Ok(None)` when nothing has been stored yet.
    fn load(&mut self) -> PixelFrameResult<Option<Snapshot>>;

    /// Replace the stored snapshot. Must not return before the write is durable or failed.
    fn save(&mut self, snapshot: &Snapshot) -> PixelFrameResult<()>;

    /// Block until this handle is the only writer.
    ///
    /// Returns the stored snapshot if another writer replaced it since this handle last
    /// loaded or saved, so the caller can catch up before mutating.
    fn lock(&mut self) -> PixelFrameResult<Option<Snapshot>>;

    /// Release the writer lock. A no-op when it is not held.
    fn unlock(&mut self);

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Snapshot stored as one JSON file, replaced atomically via a sibling temp file.
///
/// Writers serialize on an exclusive lock over `<file>.lock`, which also excludes other
/// processes pointed at the same snapshot.
#[derive(Debug)]
pub struct FsGridStore {
    path: PathBuf,
    lock: Option<File>,
    /// Bytes last read or written by this handle.
    seen: Option<Vec<u8>>,
}

impl FsGridStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: None,
            seen: None,
        }
    }

    /// Snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the writer lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Unique per writer, so concurrent saves never share a temp file.
    fn temp_path(&self) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.sibling(&format!(".{}-{seq}.tmp", std::process::id()))
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    fn read_bytes(&self) -> PixelFrameResult<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read snapshot", &self.path, e)),
        }
    }
}

fn io_error(what: &str, path: &Path, e: std::io::Error) -> PixelFrameError {
    PixelFrameError::persistence(format!("{what} '{}': {e}", path.display()))
}

fn write_then_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> PixelFrameResult<()> {
    let mut f = File::create(tmp).map_err(|e| io_error("create", tmp, e))?;
    f.write_all(bytes).map_err(|e| io_error("write", tmp, e))?;
    f.sync_all().map_err(|e| io_error("sync", tmp, e))?;
    drop(f);
    std::fs::rename(tmp, target).map_err(|e| io_error("replace", target, e))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

impl GridStore for FsGridStore {
    fn load(&mut self) -> PixelFrameResult<Option<Snapshot>> {
        let Some(bytes) = self.read_bytes()? else {
            return Ok(None);
        };
        // Remembered even when unparsable, so a recovered canvas may overwrite the file.
        let parsed = Snapshot::from_json_slice(&bytes);
        self.seen = Some(bytes);
        parsed.map(Some)
    }

    fn save(&mut self, snapshot: &Snapshot) -> PixelFrameResult<()> {
        let bytes = snapshot.to_json_bytes()?;
        let dir = self.parent_dir().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| io_error("create snapshot dir", &dir, e))?;

        let tmp = self.temp_path();
        if let Err(err) = write_then_rename(&tmp, &self.path, &bytes) {
            let _ = std::fs::remove_file(&tmp);
            return Err(err);
        }
        sync_dir(&dir).map_err(|e| io_error("sync snapshot dir", &dir, e))?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot written");
        self.seen = Some(bytes);
        Ok(())
    }

    fn lock(&mut self) -> PixelFrameResult<Option<Snapshot>> {
        if self.lock.is_none() {
            let dir = self.parent_dir().to_path_buf();
            std::fs::create_dir_all(&dir)
                .map_err(|e| io_error("create snapshot dir", &dir, e))?;
            let path = self.lock_path();
            let f = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)
                .map_err(|e| io_error("open lock", &path, e))?;
            f.lock().map_err(|e| io_error("lock", &path, e))?;
            self.lock = Some(f);
        }

        let Some(bytes) = self.read_bytes()? else {
            return Ok(None);
        };
        if self.seen.as_deref() == Some(bytes.as_slice()) {
            return Ok(None);
        }
        let snapshot = Snapshot::from_json_slice(&bytes)?;
        self.seen = Some(bytes);
        Ok(Some(snapshot))
    }

    fn unlock(&mut self) {
        if let Some(f) = self.lock.take() {
            if let Err(e) = f.unlock() {
                tracing::warn!(path = %self.lock_path().display(), error = %e, "unlock failed");
            }
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    snapshot: Option<Snapshot>,
    fail_saves: bool,
    saves: usize,
    writer: bool,
}

#[derive(Debug, Default)]
struct MemoryShared {
    inner: Mutex<MemoryInner>,
    released: Condvar,
}

/// In-process store. Clones share the same contents and writer lock, so a test can keep a
/// handle while one or more canvases own others.
#[derive(Debug, Default)]
pub struct MemoryGridStore {
    shared: Arc<MemoryShared>,
    /// Save count last observed by this handle.
    seen: usize,
    holding: bool,
}

impl Clone for MemoryGridStore {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            seen: self.seen,
            holding: false,
        }
    }
}

impl MemoryGridStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a snapshot.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::default();
        store.shared.inner.lock().snapshot = Some(snapshot);
        store
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.shared.inner.lock().fail_saves = fail;
    }

    /// Last successfully saved snapshot.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.shared.inner.lock().snapshot.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.shared.inner.lock().saves
    }
}

impl GridStore for MemoryGridStore {
    fn load(&mut self) -> PixelFrameResult<Option<Snapshot>> {
        let inner = self.shared.inner.lock();
        self.seen = inner.saves;
        Ok(inner.snapshot.clone())
    }

    fn save(&mut self, snapshot: &Snapshot) -> PixelFrameResult<()> {
        let mut inner = self.shared.inner.lock();
        if inner.fail_saves {
            return Err(PixelFrameError::persistence("memory store is read-only"));
        }
        inner.snapshot = Some(snapshot.clone());
        inner.saves += 1;
        self.seen = inner.saves;
        Ok(())
    }

    fn lock(&mut self) -> PixelFrameResult<Option<Snapshot>> {
        let mut inner = self.shared.inner.lock();
        if !self.holding {
            while inner.writer {
                self.shared.released.wait(&mut inner);
            }
            inner.writer = true;
            self.holding = true;
        }
        if inner.saves == self.seen {
            return Ok(None);
        }
        self.seen = inner.saves;
        Ok(inner.snapshot.clone())
    }

    fn unlock(&mut self) {
        if !self.holding {
            return;
        }
        self.holding = false;
        self.shared.inner.lock().writer = false;
        self.shared.released.notify_one();
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/store.rs"]
mod tests;
