pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Map a wave sample in `[-1, 1]` to a channel value `round(s * amplitude + offset)`.
pub(crate) fn wave_channel(s: f64, amplitude: f64, offset: f64) -> u8 {
    (s * amplitude + offset).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
