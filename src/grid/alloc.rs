use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard};

use crate::foundation::core::{GridGeometry, TileCoord};
use crate::foundation::error::{PixelFrameError, PixelFrameResult};
use crate::grid::model::{CanvasState, CellState};
use crate::grid::store::{GridStore, MemoryGridStore, Snapshot, SnapshotRecovery};

/// First-available tile allocation over a [`CanvasState`].
///
/// Anchors are scanned row-major (`y` outer, `x` inner) from the origin, so the `n`-th
/// successful claim on an empty grid always lands on `geometry.coord_at(n)`.
pub struct AllocationEngine;

impl AllocationEngine {
    /// Claim the first unclaimed tile for `owner`.
    ///
    /// Returns `None` when every tile is taken; the state is left untouched in that case.
    /// The caller is responsible for persisting the mutation.
    pub fn claim(state: &mut CanvasState, owner: &str) -> Option<TileCoord> {
        let geometry = state.grid.geometry();
        let idx = state.grid.cells().iter().position(|c| !c.is_claimed())?;
        let coord = geometry.coord_at(idx)?;

        state
            .grid
            .set(
                coord,
                CellState::Claimed {
                    owner: owner.to_string(),
                },
            )
            .ok()?;
        state.claims.push(owner, coord);
        Some(coord)
    }

    /// Undo the most recent claim of `coord` by `owner`. Only valid before anyone else claims.
    pub(crate) fn revert(state: &mut CanvasState, owner: &str, coord: TileCoord) -> bool {
        if state.grid.get(coord).and_then(CellState::owner) != Some(owner) {
            return false;
        }
        if !state.claims.pop_if_last(owner, coord) {
            return false;
        }
        state.grid.set(coord, CellState::Unclaimed).is_ok()
    }
}

/// Claim counters for a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CanvasStats {
    /// Claimed tiles.
    pub claimed: usize,
    /// All tiles.
    pub total: usize,
    /// Distinct owners.
    pub owners: usize,
}

impl CanvasStats {
    /// Tiles still available.
    pub fn remaining(self) -> usize {
        self.total - self.claimed
    }
}

/// Shared canvas handle: the in-memory state plus the store it is persisted to.
///
/// Claims are serialized by the store mutex and the store's writer lock, both held from the
/// scan until the snapshot is durable, so storage sees claims in the same total order as
/// memory even with several processes on one snapshot. The state lock is only held while
/// mutating, so renders never see a half-applied claim.
pub struct PixelCanvas {
    geometry: GridGeometry,
    state: RwLock<CanvasState>,
    store: Mutex<Box<dyn GridStore>>,
}

impl PixelCanvas {
    /// Load the canvas from `store`, starting empty when no snapshot exists.
    pub fn open(
        mut store: Box<dyn GridStore>,
        geometry: GridGeometry,
        recovery: SnapshotRecovery,
    ) -> PixelFrameResult<Self> {
        let state = match store.load().and_then(|s| match s {
            Some(snap) => snap.restore(geometry).map(Some),
            None => Ok(None),
        }) {
            Ok(Some(state)) => {
                tracing::info!(
                    store = %store.describe(),
                    claimed = state.grid.claimed_count(),
                    owners = state.claims.owner_count(),
                    "loaded canvas snapshot"
                );
                state
            }
            Ok(None) => {
                tracing::info!(store = %store.describe(), "no snapshot, starting empty canvas");
                CanvasState::new(geometry)
            }
            Err(err) => match recovery {
                SnapshotRecovery::Fail => return Err(err),
                SnapshotRecovery::StartEmpty => {
                    tracing::warn!(
                        store = %store.describe(),
                        error = %err,
                        "unusable snapshot, starting empty canvas"
                    );
                    CanvasState::new(geometry)
                }
            },
        };

        Ok(Self {
            geometry,
            state: RwLock::new(state),
            store: Mutex::new(store),
        })
    }

    /// Empty canvas backed by a fresh [`MemoryGridStore`].
    pub fn in_memory(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            state: RwLock::new(CanvasState::new(geometry)),
            store: Mutex::new(Box::new(MemoryGridStore::new())),
        }
    }

    /// Lattice shape.
    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    /// Claim the next free tile for `owner` and persist the result.
    ///
    /// The store's writer lock is held from the scan until the snapshot is durable, and a
    /// snapshot written meanwhile by another writer is adopted first. `Ok(None)` means the
    /// canvas is full. A failed save rolls the claim back and is reported as
    /// [`PixelFrameError::Persistence`].
    #[tracing::instrument(skip(self))]
    pub fn claim(&self, owner: &str) -> PixelFrameResult<Option<TileCoord>> {
        if owner.trim().is_empty() {
            return Err(PixelFrameError::validation("owner id must be non-empty"));
        }

        let (mut store, latest) = WriterLock::acquire(self.store.lock())?;
        if let Some(snapshot) = latest {
            let fresh = snapshot.restore(self.geometry)?;
            tracing::debug!(
                claimed = fresh.grid.claimed_count(),
                "adopted snapshot from another writer"
            );
            *self.state.write() = fresh;
        }

        let (coord, snapshot) = {
            let mut state = self.state.write();
            let Some(coord) = AllocationEngine::claim(&mut state, owner) else {
                tracing::warn!("canvas full, no tile available");
                return Ok(None);
            };
            (coord, Snapshot::capture(&state))
        };

        if let Err(err) = store.save(&snapshot) {
            let reverted = AllocationEngine::revert(&mut self.state.write(), owner, coord);
            tracing::warn!(%coord, reverted, error = %err, "snapshot save failed, claim rolled back");
            return Err(match err {
                e @ PixelFrameError::Persistence(_) => e,
                other => PixelFrameError::persistence(other.to_string()),
            });
        }

        tracing::info!(%coord, "tile claimed");
        Ok(Some(coord))
    }

    /// Claims recorded for `owner`, oldest first.
    pub fn claims_for(&self, owner: &str) -> Vec<TileCoord> {
        self.state.read().claims.get(owner).to_vec()
    }

    /// Current claim counters.
    pub fn stats(&self) -> CanvasStats {
        let state = self.state.read();
        CanvasStats {
            claimed: state.grid.claimed_count(),
            total: self.geometry.cell_count(),
            owners: state.claims.owner_count(),
        }
    }

    /// Snapshot-consistent read access, e.g. for rendering.
    pub fn read(&self) -> RwLockReadGuard<'_, CanvasState> {
        self.state.read()
    }
}

/// Store handle holding the writer lock; released on drop.
struct WriterLock<'a> {
    store: MutexGuard<'a, Box<dyn GridStore>>,
}

impl<'a> WriterLock<'a> {
    fn acquire(
        mut store: MutexGuard<'a, Box<dyn GridStore>>,
    ) -> PixelFrameResult<(Self, Option<Snapshot>)> {
        match store.lock() {
            Ok(latest) => Ok((Self { store }, latest)),
            Err(err) => {
                store.unlock();
                Err(err)
            }
        }
    }

    fn save(&mut self, snapshot: &Snapshot) -> PixelFrameResult<()> {
        self.store.save(snapshot)
    }
}

impl Drop for WriterLock<'_> {
    fn drop(&mut self) {
        self.store.unlock();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/alloc.rs"]
mod tests;
