use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{PixelFrameError, PixelFrameResult};

/// DejaVu Sans, compiled in so captions rasterize identically on every host.
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
/// Family name of [`BUNDLED_FONT`].
pub(crate) const BUNDLED_FAMILY: &str = "DejaVu Sans";

/// Text overlay drawn on top of every preview.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Caption text.
    pub text: String,
    /// Left edge of the text, in output pixels.
    pub x: f32,
    /// Baseline of the text, in output pixels.
    pub y: f32,
    /// Font size in pixels.
    pub font_size: f32,
    /// CSS-style font family list. Generic families resolve to the bundled DejaVu Sans.
    pub font_family: String,
    /// Fill color.
    pub color: Rgba8,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            text: "Million Pixel Frame".to_string(),
            x: 10.0,
            y: 50.0,
            font_size: 30.0,
            font_family: BUNDLED_FAMILY.to_string(),
            color: Rgba8::BLACK,
        }
    }
}

/// Rasterizes captions through usvg/resvg with a font database built once.
pub(crate) struct CaptionRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl CaptionRenderer {
    pub(crate) fn new(font_dirs: &[PathBuf], system_fonts: bool) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_font_data(BUNDLED_FONT.to_vec());
        db.set_sans_serif_family(BUNDLED_FAMILY);
        db.set_serif_family(BUNDLED_FAMILY);
        if system_fonts {
            db.load_system_fonts();
        }
        for dir in font_dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "caption font database ready");
        Self {
            fontdb: Arc::new(db),
        }
    }

    #[cfg(test)]
    pub(crate) fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Premultiplied RGBA8 layer of `canvas` size holding only the caption.
    ///
    /// Text without a resolvable font is dropped by usvg, leaving the layer transparent.
    pub(crate) fn rasterize(
        &self,
        caption: &CaptionSettings,
        canvas: Canvas,
    ) -> PixelFrameResult<Vec<u8>> {
        let svg = caption_svg(caption, canvas);
        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opts)
            .map_err(|e| PixelFrameError::render(format!("parse caption svg: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas.width, canvas.height)
            .ok_or_else(|| PixelFrameError::render("failed to allocate caption pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::default(),
            &mut pixmap.as_mut(),
        );
        Ok(pixmap.take())
    }
}

pub(crate) fn caption_svg(caption: &CaptionSettings, canvas: Canvas) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" fill="{fill}" fill-opacity="{opacity}">{text}</text>"#,
            "</svg>"
        ),
        w = canvas.width,
        h = canvas.height,
        x = caption.x,
        y = caption.y,
        family = escape_xml(&caption.font_family),
        size = caption.font_size,
        fill = caption.color.to_hex_rgb(),
        opacity = f32::from(caption.color.a) / 255.0,
        text = escape_xml(&caption.text),
    )
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font dir not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping font file");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/caption.rs"]
mod tests;
