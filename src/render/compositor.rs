use std::path::PathBuf;

use image::ImageEncoder as _;

use crate::foundation::core::{Canvas, GridGeometry, Rgba8, TileCoord};
use crate::foundation::error::{PixelFrameError, PixelFrameResult};
use crate::grid::model::CanvasState;
use crate::render::caption::{CaptionRenderer, CaptionSettings};
use crate::render::color::TileColorModel;
use crate::render::composite::{PixelRect, blend_rect, fill_rect, over_in_place};

/// Output appearance of rendered previews.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Output raster size.
    pub canvas: Canvas,
    /// Color behind the tiles.
    pub background: Rgba8,
    /// Color blended over the highlighted tile.
    pub highlight: Rgba8,
    /// Caption overlay; `None` disables it.
    pub caption: Option<CaptionSettings>,
    /// Extra directories scanned for `.ttf`/`.otf`/`.ttc` fonts.
    pub font_dirs: Vec<PathBuf>,
    /// Also load the host's fonts. Captions then depend on what is installed.
    pub system_fonts: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            background: Rgba8::WHITE,
            highlight: Rgba8::new(255, 255, 0, 128),
            caption: Some(CaptionSettings::default()),
            font_dirs: Vec::new(),
            system_fonts: false,
        }
    }
}

impl RenderSettings {
    /// Check sizes and caption parameters.
    pub fn validate(&self) -> PixelFrameResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(PixelFrameError::validation(
                "render canvas must be at least 1x1",
            ));
        }
        const MAX_DIM: u32 = 16_384;
        if self.canvas.width > MAX_DIM || self.canvas.height > MAX_DIM {
            return Err(PixelFrameError::validation(format!(
                "render canvas too large: {}x{} (max {MAX_DIM}x{MAX_DIM})",
                self.canvas.width, self.canvas.height
            )));
        }
        if let Some(c) = &self.caption {
            if !c.font_size.is_finite() || c.font_size <= 0.0 {
                return Err(PixelFrameError::validation(
                    "caption font_size must be finite and > 0",
                ));
            }
            if !c.x.is_finite() || !c.y.is_finite() {
                return Err(PixelFrameError::validation(
                    "caption position must be finite",
                ));
            }
        }
        Ok(())
    }

    /// Reject lattices whose tiles would be narrower than one output pixel.
    pub fn check_geometry(&self, geometry: GridGeometry) -> PixelFrameResult<()> {
        let side = u64::from(self.canvas.width) * u64::from(geometry.token_size())
            / u64::from(geometry.grid_size());
        if side == 0 {
            return Err(PixelFrameError::validation(format!(
                "{}-unit tiles on a {}-unit grid vanish on a {}px wide canvas",
                geometry.token_size(),
                geometry.grid_size(),
                self.canvas.width
            )));
        }
        Ok(())
    }
}

/// A rendered frame as RGBA8 pixels, tightly packed and row-major.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

/// Renders a canvas state into a preview raster.
///
/// Paint order is fixed: background, tile fills, highlight blend, caption.
pub struct Compositor {
    settings: RenderSettings,
    caption: Option<CaptionRenderer>,
}

impl Compositor {
    /// Validate settings and build the caption font database.
    pub fn new(settings: RenderSettings) -> PixelFrameResult<Self> {
        settings.validate()?;
        let caption = settings
            .caption
            .as_ref()
            .filter(|c| !c.text.is_empty())
            .map(|_| CaptionRenderer::new(&settings.font_dirs, settings.system_fonts));
        Ok(Self { settings, caption })
    }

    /// Active settings.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Output rectangle of the tile anchored at `coord`.
    ///
    /// Both axes scale by `canvas.width / grid_size`, floored, so the grid keeps its aspect
    /// ratio and is cropped at the bottom of a landscape canvas.
    pub(crate) fn tile_rect(&self, geometry: GridGeometry, coord: TileCoord) -> PixelRect {
        let width = u64::from(self.settings.canvas.width);
        let grid = u64::from(geometry.grid_size());
        let scale = |v: u32| (u64::from(v) * width / grid) as u32;
        let side = scale(geometry.token_size());
        PixelRect::new(scale(coord.x), scale(coord.y), side, side)
    }

    /// Render `state`, optionally highlighting one tile.
    #[tracing::instrument(skip(self, state))]
    pub fn render(
        &self,
        state: &CanvasState,
        highlight: Option<TileCoord>,
    ) -> PixelFrameResult<FrameRGBA> {
        let canvas = self.settings.canvas;
        let geometry = state.grid.geometry();
        self.settings.check_geometry(geometry)?;

        let bg = self.settings.background.premultiplied();
        let mut data = bg.repeat(canvas.width as usize * canvas.height as usize);

        for (coord, cell) in state.grid.iter() {
            let color = TileColorModel::color_at(coord, cell.is_claimed());
            fill_rect(
                &mut data,
                canvas,
                self.tile_rect(geometry, coord),
                color.premultiplied(),
            );
        }

        if let Some(coord) = highlight {
            if geometry.cell_index(coord).is_some() {
                blend_rect(
                    &mut data,
                    canvas,
                    self.tile_rect(geometry, coord),
                    self.settings.highlight.premultiplied(),
                );
            } else {
                tracing::warn!(%coord, "highlight is not a tile anchor, ignoring");
            }
        }

        if let (Some(caption), Some(renderer)) = (&self.settings.caption, &self.caption) {
            let layer = renderer.rasterize(caption, canvas)?;
            over_in_place(&mut data, &layer, 1.0)?;
        }

        Ok(FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data,
            premultiplied: true,
        })
    }

    /// [`Compositor::render`] followed by [`encode_png`].
    pub fn render_png(
        &self,
        state: &CanvasState,
        highlight: Option<TileCoord>,
    ) -> PixelFrameResult<Vec<u8>> {
        let frame = self.render(state, highlight)?;
        encode_png(&frame)
    }
}

/// Turns a canvas state into preview PNG bytes.
pub trait PreviewRenderer: Send + Sync {
    /// Render `state`, optionally highlighting one tile.
    fn render_png(
        &self,
        state: &CanvasState,
        highlight: Option<TileCoord>,
    ) -> PixelFrameResult<Vec<u8>>;
}

impl PreviewRenderer for Compositor {
    fn render_png(
        &self,
        state: &CanvasState,
        highlight: Option<TileCoord>,
    ) -> PixelFrameResult<Vec<u8>> {
        Compositor::render_png(self, state, highlight)
    }
}

/// Encode a frame as a straight-alpha RGBA8 PNG.
pub fn encode_png(frame: &FrameRGBA) -> PixelFrameResult<Vec<u8>> {
    let expected = (frame.width as usize) * (frame.height as usize) * 4;
    if frame.data.len() != expected {
        return Err(PixelFrameError::render(format!(
            "frame buffer is {} bytes, expected {expected}",
            frame.data.len()
        )));
    }

    let straight;
    let pixels = if frame.premultiplied {
        straight = unpremultiply(&frame.data);
        &straight
    } else {
        &frame.data
    };

    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            pixels,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| PixelFrameError::render(format!("encode png: {e}")))?;
    Ok(out)
}

fn unpremultiply(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
        } else if a < 255 {
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
