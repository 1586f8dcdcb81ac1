use super::*;

#[test]
fn origin_colors() {
    assert_eq!(
        TileColorModel::color(0, 0, false),
        Rgba8::opaque(225, 225, 225)
    );
    assert_eq!(
        TileColorModel::color(0, 0, true),
        Rgba8::opaque(128, 128, 128)
    );
}

#[test]
fn claimed_channels_follow_their_axis() {
    let expect = |v: f64| ((v.sin() * 127.0) + 128.0).round() as u8;
    let c = TileColorModel::color(10, 20, true);
    assert_eq!(c.r, expect(3.0));
    assert_eq!(c.g, expect(6.0));
    assert_eq!(c.b, expect(9.0));
    assert_eq!(c.a, 255);
}

#[test]
fn unclaimed_is_gray_wash_in_range() {
    for (x, y) in [(0, 0), (10, 0), (50, 70), (990, 990), (150, 10)] {
        let c = TileColorModel::color(x, y, false);
        assert_eq!(c.r, c.g);
        assert_eq!(c.g, c.b);
        assert!((195..=255).contains(&c.r), "{x},{y} -> {}", c.r);
        assert_eq!(c.a, 255);
    }
    assert_eq!(
        TileColorModel::color(10, 0, false).r,
        ((1.0f64).sin() * 30.0 + 225.0).round() as u8
    );
}

#[test]
fn color_is_pure() {
    let a = TileColorModel::color_at(TileCoord::new(340, 120), true);
    let b = TileColorModel::color(340, 120, true);
    assert_eq!(a, b);
    assert_eq!(
        TileColorModel::color(340, 120, false),
        TileColorModel::color(340, 120, false)
    );
}
