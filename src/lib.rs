//! pixelframe is a shared, persistent pixel canvas.
//!
//! A square grid is split into fixed-size tiles. Each tile can be claimed exactly once by an
//! external identity, in deterministic row-major order, and a PNG preview of the whole canvas
//! can be rendered on demand.
//!
//! - [`PixelCanvas`] owns the grid and claim index, serializes claims, and persists every
//!   claim through a [`GridStore`] before reporting it.
//! - [`Compositor`] paints tiles with [`TileColorModel`], blends an optional highlight, and
//!   draws a caption.
//! - [`FrameService`] shows the call order used by a protocol adapter: verify, claim, render.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Frame-config loading and wiring.
pub mod config;
pub mod grid;
pub mod render;
pub mod service;

pub use crate::config::FrameConfig;
pub use crate::foundation::core::{
    Canvas, GRID_SIZE, GridGeometry, MAX_CELLS, OUTPUT_HEIGHT, OUTPUT_WIDTH, Rgba8, TOKEN_SIZE,
    TileCoord,
};
pub use crate::foundation::error::{PixelFrameError, PixelFrameResult};
pub use crate::grid::alloc::{AllocationEngine, CanvasStats, PixelCanvas};
pub use crate::grid::model::{CanvasState, CellState, ClaimIndex, Grid};
pub use crate::grid::store::{
    FsGridStore, GridStore, MemoryGridStore, SNAPSHOT_VERSION, Snapshot, SnapshotRecovery,
};
pub use crate::render::caption::CaptionSettings;
pub use crate::render::color::TileColorModel;
pub use crate::render::compositor::{
    Compositor, FrameRGBA, PreviewRenderer, RenderSettings, encode_png,
};
pub use crate::service::frame::{
    ClaimOutcome, FrameAction, FrameResponse, FrameService, SignatureVerifier, TrustAll,
};
