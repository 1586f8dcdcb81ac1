use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::core::{GRID_SIZE, GridGeometry, TOKEN_SIZE};
use crate::foundation::error::{PixelFrameError, PixelFrameResult};
use crate::grid::alloc::PixelCanvas;
use crate::grid::store::{FsGridStore, SnapshotRecovery};
use crate::render::compositor::{Compositor, RenderSettings};
use crate::service::frame::{FrameService, SignatureVerifier};

/// File-backed configuration for a canvas deployment.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    /// Snapshot file holding the grid and claim index.
    pub snapshot_path: PathBuf,
    /// Grid side length in grid units.
    pub grid_size: u32,
    /// Tile side length in grid units.
    pub token_size: u32,
    /// What to do with an unreadable or inconsistent snapshot at startup.
    pub on_corrupt_snapshot: SnapshotRecovery,
    /// Preview appearance.
    pub render: RenderSettings,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("data").join("canvas.json"),
            grid_size: GRID_SIZE,
            token_size: TOKEN_SIZE,
            on_corrupt_snapshot: SnapshotRecovery::Fail,
            render: RenderSettings::default(),
        }
    }
}

impl FrameConfig {
    /// Parse a config from a JSON reader. Missing fields take their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> PixelFrameResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| PixelFrameError::validation(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PixelFrameResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PixelFrameError::validation(format!("open config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check geometry and render settings, and that every tile stays visible.
    pub fn validate(&self) -> PixelFrameResult<()> {
        let geometry = self.geometry()?;
        self.render.validate()?;
        self.render.check_geometry(geometry)
    }

    /// Validated lattice shape.
    pub fn geometry(&self) -> PixelFrameResult<GridGeometry> {
        GridGeometry::new(self.grid_size, self.token_size)
    }

    /// Open the snapshot file and build the shared canvas.
    pub fn open_canvas(&self) -> PixelFrameResult<PixelCanvas> {
        PixelCanvas::open(
            Box::new(FsGridStore::new(&self.snapshot_path)),
            self.geometry()?,
            self.on_corrupt_snapshot,
        )
    }

    /// Build a compositor from [`FrameConfig::render`].
    pub fn compositor(&self) -> PixelFrameResult<Compositor> {
        Compositor::new(self.render.clone())
    }

    /// Wire the canvas, compositor and verifier into a service.
    pub fn build_service(
        &self,
        verifier: Box<dyn SignatureVerifier>,
    ) -> PixelFrameResult<FrameService> {
        let canvas = Arc::new(self.open_canvas()?);
        Ok(FrameService::new(canvas, self.compositor()?, verifier))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
