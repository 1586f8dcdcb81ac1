use crate::foundation::core::{Rgba8, TileCoord};
use crate::foundation::math::wave_channel;

/// Procedural tile palette.
///
/// Claimed tiles get a sine-wave hue from their coordinates; unclaimed tiles get a slowly
/// varying near-white gray. The result depends only on the arguments.
pub struct TileColorModel;

impl TileColorModel {
    /// Color of the tile anchored at `(x, y)`.
    pub fn color(x: u32, y: u32, claimed: bool) -> Rgba8 {
        let (x, y) = (f64::from(x), f64::from(y));
        if claimed {
            Rgba8::opaque(
                wave_channel((0.3 * x).sin(), 127.0, 128.0),
                wave_channel((0.3 * y).sin(), 127.0, 128.0),
                wave_channel((0.3 * (x + y)).sin(), 127.0, 128.0),
            )
        } else {
            let v = wave_channel((0.1 * (x + y)).sin(), 30.0, 225.0);
            Rgba8::opaque(v, v, v)
        }
    }

    /// [`TileColorModel::color`] for a [`TileCoord`].
    pub fn color_at(coord: TileCoord, claimed: bool) -> Rgba8 {
        Self::color(coord.x, coord.y, claimed)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/color.rs"]
mod tests;
