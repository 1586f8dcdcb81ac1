use super::*;
use crate::grid::alloc::AllocationEngine;

fn plain() -> Compositor {
    Compositor::new(RenderSettings {
        caption: None,
        ..RenderSettings::default()
    })
    .unwrap()
}

fn empty_state() -> CanvasState {
    CanvasState::new(GridGeometry::default())
}

#[test]
fn settings_validation() {
    let mut s = RenderSettings::default();
    s.canvas.width = 0;
    assert!(Compositor::new(s).is_err());

    let mut s = RenderSettings::default();
    if let Some(c) = s.caption.as_mut() {
        c.font_size = -1.0;
    }
    assert!(Compositor::new(s).is_err());
}

#[test]
fn sub_pixel_tiles_are_refused() {
    let narrow = Compositor::new(RenderSettings {
        canvas: Canvas {
            width: 500,
            height: 300,
        },
        caption: None,
        ..RenderSettings::default()
    })
    .unwrap();
    let fine = GridGeometry::new(1000, 1).unwrap();
    assert!(narrow.settings().check_geometry(fine).is_err());
    assert!(matches!(
        narrow.render(&CanvasState::new(fine), None),
        Err(PixelFrameError::Validation(_))
    ));
    assert!(plain().settings().check_geometry(fine).is_ok());
}

#[test]
fn tile_rects_scale_by_width() {
    let c = plain();
    let g = GridGeometry::default();
    assert_eq!(
        c.tile_rect(g, TileCoord::new(0, 0)),
        PixelRect::new(0, 0, 12, 12)
    );
    assert_eq!(
        c.tile_rect(g, TileCoord::new(10, 0)),
        PixelRect::new(12, 0, 12, 12)
    );
    assert_eq!(
        c.tile_rect(g, TileCoord::new(990, 520)),
        PixelRect::new(1188, 624, 12, 12)
    );
}

#[test]
fn empty_canvas_shows_gray_wash() {
    let frame = plain().render(&empty_state(), None).unwrap();
    assert_eq!((frame.width, frame.height), (1200, 630));
    assert_eq!(frame.data.len(), 1200 * 630 * 4);
    assert_eq!(frame.pixel(0, 0), Some([225, 225, 225, 255]));

    let c = TileColorModel::color(10, 0, false).to_array();
    assert_eq!(frame.pixel(12, 0), Some(c));
    assert_eq!(frame.pixel(23, 11), Some(c));

    let bottom = TileColorModel::color(0, 520, false).to_array();
    assert_eq!(frame.pixel(0, 629), Some(bottom));
    assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn claimed_tile_uses_claimed_palette() {
    let mut state = empty_state();
    AllocationEngine::claim(&mut state, "42");
    AllocationEngine::claim(&mut state, "42");
    let frame = plain().render(&state, None).unwrap();
    assert_eq!(frame.pixel(5, 5), Some([128, 128, 128, 255]));
    assert_eq!(
        frame.pixel(15, 5),
        Some(TileColorModel::color(10, 0, true).to_array())
    );
    assert_eq!(
        frame.pixel(30, 5),
        Some(TileColorModel::color(20, 0, false).to_array())
    );
}

#[test]
fn highlight_blends_half_yellow_over_tile() {
    let mut state = empty_state();
    let coord = AllocationEngine::claim(&mut state, "42").unwrap();
    let frame = plain().render(&state, Some(coord)).unwrap();
    assert_eq!(frame.pixel(0, 0), Some([192, 192, 64, 255]));
    assert_eq!(frame.pixel(11, 11), Some([192, 192, 64, 255]));
    assert_eq!(frame.pixel(12, 0), Some(TileColorModel::color(10, 0, false).to_array()));
}

#[test]
fn highlight_off_anchor_is_ignored() {
    let state = empty_state();
    let a = plain().render(&state, Some(TileCoord::new(3, 3))).unwrap();
    let b = plain().render(&state, None).unwrap();
    assert_eq!(a.data, b.data);
}

#[test]
fn render_is_deterministic() {
    let mut state = empty_state();
    for i in 0..250 {
        AllocationEngine::claim(&mut state, &format!("o{}", i % 3));
    }
    let c = plain();
    let a = c.render(&state, Some(TileCoord::new(100, 10))).unwrap();
    let b = c.render(&state, Some(TileCoord::new(100, 10))).unwrap();
    assert_eq!(a.data, b.data);
}

#[test]
fn caption_is_drawn_last_and_spares_tile_origin() {
    let mut state = empty_state();
    let coord = AllocationEngine::claim(&mut state, "42").unwrap();
    let comp = Compositor::new(RenderSettings::default()).unwrap();
    let frame = comp.render(&state, Some(coord)).unwrap();
    assert_eq!(frame.pixel(2, 2), Some([192, 192, 64, 255]));

    let without = plain().render(&state, Some(coord)).unwrap();
    assert_ne!(frame.data, without.data);
    assert_eq!(comp.render(&state, Some(coord)).unwrap().data, frame.data);
}

#[test]
fn png_round_trips_through_decoder() {
    let mut state = empty_state();
    let coord = AllocationEngine::claim(&mut state, "42").unwrap();
    let png = plain().render_png(&state, Some(coord)).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (1200, 630));
    assert_eq!(img.get_pixel(0, 0).0, [192, 192, 64, 255]);
    assert_eq!(img.get_pixel(100, 300).0[3], 255);
}

#[test]
fn encode_rejects_bad_buffer_and_unpremultiplies() {
    let bad = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 3],
        premultiplied: true,
    };
    assert!(matches!(encode_png(&bad), Err(PixelFrameError::Render(_))));

    assert_eq!(
        unpremultiply(&[64, 0, 32, 128, 9, 9, 9, 0]),
        vec![128, 0, 64, 128, 0, 0, 0, 0]
    );
}
