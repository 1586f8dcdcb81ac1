use crate::foundation::error::{PixelFrameError, PixelFrameResult};
use crate::foundation::math::mul_div255_u8;

/// Side length of the logical grid, in grid units.
pub const GRID_SIZE: u32 = 1000;
/// Side length of one claimable tile, in grid units.
pub const TOKEN_SIZE: u32 = 10;
/// Default output raster width in pixels.
pub const OUTPUT_WIDTH: u32 = 1200;
/// Default output raster height in pixels.
pub const OUTPUT_HEIGHT: u32 = 630;
/// Largest accepted lattice, in tiles (1024 x 1024).
pub const MAX_CELLS: usize = 1 << 20;

/// Tile anchor in logical grid units.
///
/// Only coordinates on a `token_size` stride are claim anchors. Serialized as an `[x, y]` pair.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct TileCoord {
    /// Column, in grid units.
    pub x: u32,
    /// Row, in grid units.
    pub y: u32,
}

impl TileCoord {
    /// Create a coordinate from grid units.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl From<[u32; 2]> for TileCoord {
    fn from([x, y]: [u32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<TileCoord> for [u32; 2] {
    fn from(c: TileCoord) -> Self {
        [c.x, c.y]
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::str::FromStr for TileCoord {
    type Err = PixelFrameError;

    /// Parse `"x,y"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| PixelFrameError::validation(format!("expected 'x,y', got '{s}'")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| PixelFrameError::validation(format!("bad coordinate '{v}': {e}")))
        };
        Ok(Self::new(parse(x)?, parse(y)?))
    }
}

/// Shape of the claimable lattice.
///
/// The grid is `grid_size` units square; anchors sit every `token_size` units, giving a
/// `lattice_side() x lattice_side()` lattice scanned in row-major order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridGeometry {
    grid_size: u32,
    token_size: u32,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            token_size: TOKEN_SIZE,
        }
    }
}

impl GridGeometry {
    /// Create a validated geometry; `token_size` must evenly divide `grid_size` and the
    /// lattice may hold at most [`MAX_CELLS`] tiles.
    pub fn new(grid_size: u32, token_size: u32) -> PixelFrameResult<Self> {
        if grid_size == 0 || token_size == 0 {
            return Err(PixelFrameError::validation(
                "grid_size and token_size must be > 0",
            ));
        }
        if grid_size % token_size != 0 {
            return Err(PixelFrameError::validation(format!(
                "token_size {token_size} must evenly divide grid_size {grid_size}"
            )));
        }
        let side = u64::from(grid_size / token_size);
        if side * side > MAX_CELLS as u64 {
            return Err(PixelFrameError::validation(format!(
                "{side}x{side} lattice exceeds {MAX_CELLS} tiles"
            )));
        }
        Ok(Self {
            grid_size,
            token_size,
        })
    }

    /// Grid side length in grid units.
    pub fn grid_size(self) -> u32 {
        self.grid_size
    }

    /// Tile side length in grid units.
    pub fn token_size(self) -> u32 {
        self.token_size
    }

    /// Number of tiles per lattice row (and column).
    pub fn lattice_side(self) -> u32 {
        self.grid_size / self.token_size
    }

    /// Total number of claimable tiles.
    pub fn cell_count(self) -> usize {
        let side = self.lattice_side() as usize;
        side * side
    }

    /// Row-major lattice index of an anchor, or `None` for off-stride or out-of-range input.
    pub fn cell_index(self, coord: TileCoord) -> Option<usize> {
        if coord.x >= self.grid_size || coord.y >= self.grid_size {
            return None;
        }
        if coord.x % self.token_size != 0 || coord.y % self.token_size != 0 {
            return None;
        }
        let side = self.lattice_side() as usize;
        let col = (coord.x / self.token_size) as usize;
        let row = (coord.y / self.token_size) as usize;
        Some(row * side + col)
    }

    /// Anchor at a row-major lattice index.
    ///
    /// This is also the coordinate granted to the `index`-th claim on an empty grid.
    pub fn coord_at(self, index: usize) -> Option<TileCoord> {
        if index >= self.cell_count() {
            return None;
        }
        let side = self.lattice_side() as usize;
        let col = (index % side) as u32;
        let row = (index / side) as u32;
        Some(TileCoord::new(
            col * self.token_size,
            row * self.token_size,
        ))
    }

    /// Iterate every anchor in row-major order (`y` outer, `x` inner).
    pub fn anchors(self) -> impl Iterator<Item = TileCoord> {
        let step = self.token_size as usize;
        let size = self.grid_size;
        (0..size)
            .step_by(step)
            .flat_map(move |y| (0..size).step_by(step).map(move |x| TileCoord::new(x, y)))
    }
}

/// Output raster dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: OUTPUT_WIDTH,
            height: OUTPUT_HEIGHT,
        }
    }
}

impl Canvas {
    /// Number of bytes in a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Fully opaque white.
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    /// Fully opaque black.
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    /// Create a color with explicit alpha.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a fully opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Premultiplied `[r, g, b, a]`.
    pub fn premultiplied(self) -> [u8; 4] {
        let a = u16::from(self.a);
        [
            mul_div255_u8(u16::from(self.r), a),
            mul_div255_u8(u16::from(self.g), a),
            mul_div255_u8(u16::from(self.b), a),
            self.a,
        ]
    }

    /// `#rrggbb` hex form, alpha dropped.
    pub fn to_hex_rgb(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
