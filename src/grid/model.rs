use std::collections::BTreeMap;

use crate::foundation::core::{GridGeometry, TileCoord};
use crate::foundation::error::{PixelFrameError, PixelFrameResult};

/// Claim state of one lattice cell.
///
/// A cell moves from `Unclaimed` to `Claimed` at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CellState {
    /// Nobody owns the tile yet.
    #[default]
    Unclaimed,
    /// The tile belongs to `owner`.
    Claimed {
        /// External identity that claimed the tile.
        owner: String,
    },
}

impl CellState {
    /// Return `true` when the cell has an owner.
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed { .. })
    }

    /// Owner identity, if claimed.
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::Unclaimed => None,
            Self::Claimed { owner } => Some(owner),
        }
    }
}

/// Canonical per-tile claim state, stored row-major over the lattice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    geometry: GridGeometry,
    cells: Vec<CellState>,
}

impl Grid {
    /// Create a grid with every cell unclaimed.
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            cells: vec![CellState::Unclaimed; geometry.cell_count()],
        }
    }

    /// Lattice shape.
    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    /// Cell at an anchor; `None` for coordinates that are not anchors.
    pub fn get(&self, coord: TileCoord) -> Option<&CellState> {
        self.geometry
            .cell_index(coord)
            .and_then(|i| self.cells.get(i))
    }

    /// Return `true` when the anchor exists and is claimed.
    pub fn is_claimed(&self, coord: TileCoord) -> bool {
        self.get(coord).is_some_and(CellState::is_claimed)
    }

    /// Number of claimed cells.
    pub fn claimed_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_claimed()).count()
    }

    /// Cells in row-major order with their anchors.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, &CellState)> {
        self.geometry.anchors().zip(self.cells.iter())
    }

    pub(crate) fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub(crate) fn set(&mut self, coord: TileCoord, state: CellState) -> PixelFrameResult<()> {
        let idx = self.geometry.cell_index(coord).ok_or_else(|| {
            PixelFrameError::validation(format!("{coord} is not a tile anchor"))
        })?;
        self.cells[idx] = state;
        Ok(())
    }
}

/// Owner identity to claimed anchors, in claim order.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ClaimIndex(BTreeMap<String, Vec<TileCoord>>);

impl ClaimIndex {
    /// Claims recorded for `owner`, oldest first. Unknown owners have none.
    pub fn get(&self, owner: &str) -> &[TileCoord] {
        self.0.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Owners with at least one claim, sorted.
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of distinct owners.
    pub fn owner_count(&self) -> usize {
        self.0.len()
    }

    /// Total number of recorded claims across owners.
    pub fn total_claims(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// `(owner, claims)` pairs, sorted by owner.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TileCoord])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub(crate) fn push(&mut self, owner: &str, coord: TileCoord) {
        self.0.entry(owner.to_string()).or_default().push(coord);
    }

    /// Remove `coord` if it is the owner's most recent claim.
    pub(crate) fn pop_if_last(&mut self, owner: &str, coord: TileCoord) -> bool {
        let Some(list) = self.0.get_mut(owner) else {
            return false;
        };
        if list.last() != Some(&coord) {
            return false;
        }
        list.pop();
        if list.is_empty() {
            self.0.remove(owner);
        }
        true
    }
}

/// The grid and its claim index, which are always read, mutated and persisted together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanvasState {
    /// Per-tile claim state.
    pub grid: Grid,
    /// Owner to claims mapping.
    pub claims: ClaimIndex,
}

impl CanvasState {
    /// Empty canvas for `geometry`.
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            grid: Grid::new(geometry),
            claims: ClaimIndex::default(),
        }
    }

    /// Check that every claimed cell appears exactly once, under its owner, in the index.
    pub fn verify_consistency(&self) -> PixelFrameResult<()> {
        let geometry = self.grid.geometry();
        let mut seen = vec![false; geometry.cell_count()];

        for (owner, coords) in self.claims.iter() {
            if coords.is_empty() {
                return Err(PixelFrameError::validation(format!(
                    "owner '{owner}' has an empty claim list"
                )));
            }
            for &coord in coords {
                let idx = geometry.cell_index(coord).ok_or_else(|| {
                    PixelFrameError::validation(format!(
                        "owner '{owner}' claims {coord}, which is not a tile anchor"
                    ))
                })?;
                if std::mem::replace(&mut seen[idx], true) {
                    return Err(PixelFrameError::validation(format!(
                        "{coord} appears more than once in the claim index"
                    )));
                }
                if self.grid.cells()[idx].owner() != Some(owner) {
                    return Err(PixelFrameError::validation(format!(
                        "{coord} is indexed under '{owner}' but the grid disagrees"
                    )));
                }
            }
        }

        for (i, (coord, cell)) in self.grid.iter().enumerate() {
            if cell.is_claimed() && !seen[i] {
                return Err(PixelFrameError::validation(format!(
                    "claimed cell {coord} is missing from the claim index"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/model.rs"]
mod tests;
