use super::*;

#[test]
fn geometry_rejects_bad_stride() {
    assert!(GridGeometry::new(0, 10).is_err());
    assert!(GridGeometry::new(100, 0).is_err());
    assert!(GridGeometry::new(100, 30).is_err());
    assert!(GridGeometry::new(100, 20).is_ok());
}

#[test]
fn geometry_caps_lattice_size() {
    assert!(GridGeometry::new(1024, 1).is_ok());
    assert_eq!(GridGeometry::new(1024, 1).unwrap().cell_count(), MAX_CELLS);
    let err = GridGeometry::new(100_000, 1).unwrap_err();
    assert!(matches!(err, PixelFrameError::Validation(_)));
    assert!(GridGeometry::new(1025, 1).is_err());
}

#[test]
fn default_geometry_has_ten_thousand_tiles() {
    let g = GridGeometry::default();
    assert_eq!(g.lattice_side(), 100);
    assert_eq!(g.cell_count(), 10_000);
}

#[test]
fn cell_index_rejects_off_stride_and_out_of_range() {
    let g = GridGeometry::default();
    assert_eq!(g.cell_index(TileCoord::new(0, 0)), Some(0));
    assert_eq!(g.cell_index(TileCoord::new(10, 0)), Some(1));
    assert_eq!(g.cell_index(TileCoord::new(0, 10)), Some(100));
    assert_eq!(g.cell_index(TileCoord::new(990, 990)), Some(9_999));
    assert_eq!(g.cell_index(TileCoord::new(5, 0)), None);
    assert_eq!(g.cell_index(TileCoord::new(1000, 0)), None);
}

#[test]
fn coord_at_matches_row_major_formula() {
    let g = GridGeometry::default();
    for n in [0usize, 1, 99, 100, 101, 5_432, 9_999] {
        let t = TOKEN_SIZE as usize;
        let expected = TileCoord::new(
            ((n * t) % GRID_SIZE as usize) as u32,
            (((n * t) / GRID_SIZE as usize) * t) as u32,
        );
        assert_eq!(g.coord_at(n), Some(expected));
        assert_eq!(g.cell_index(expected), Some(n));
    }
    assert_eq!(g.coord_at(10_000), None);
}

#[test]
fn anchors_are_row_major() {
    let g = GridGeometry::new(30, 10).unwrap();
    let all: Vec<_> = g.anchors().collect();
    assert_eq!(all.len(), 9);
    assert_eq!(all[0], TileCoord::new(0, 0));
    assert_eq!(all[1], TileCoord::new(10, 0));
    assert_eq!(all[3], TileCoord::new(0, 10));
    assert_eq!(all[8], TileCoord::new(20, 20));
}

#[test]
fn tile_coord_serializes_as_pair_and_parses_from_str() {
    let c = TileCoord::new(10, 20);
    assert_eq!(serde_json::to_string(&c).unwrap(), "[10,20]");
    let back: TileCoord = serde_json::from_str("[10,20]").unwrap();
    assert_eq!(back, c);
    assert_eq!("10, 20".parse::<TileCoord>().unwrap(), c);
    assert!("10".parse::<TileCoord>().is_err());
    assert!("a,b".parse::<TileCoord>().is_err());
    assert_eq!(c.to_string(), "(10, 20)");
}

#[test]
fn rgba_premultiply_and_hex() {
    assert_eq!(
        Rgba8::new(255, 255, 0, 128).premultiplied(),
        [128, 128, 0, 128]
    );
    assert_eq!(Rgba8::opaque(1, 2, 3).premultiplied(), [1, 2, 3, 255]);
    assert_eq!(Rgba8::opaque(255, 0, 16).to_hex_rgb(), "#ff0010");
}
