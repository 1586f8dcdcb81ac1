use super::*;
use crate::foundation::core::Rgba8;

#[test]
fn empty_object_uses_defaults() {
    let cfg = FrameConfig::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(cfg, FrameConfig::default());
    assert_eq!(cfg.geometry().unwrap(), GridGeometry::default());
    assert_eq!(cfg.render.canvas.width, 1200);
    assert_eq!(cfg.render.highlight, Rgba8::new(255, 255, 0, 128));
}

#[test]
fn partial_override() {
    let json = r#"{
        "snapshot_path": "state/grid.json",
        "on_corrupt_snapshot": "start_empty",
        "render": { "caption": null, "canvas": { "width": 600, "height": 315 } }
    }"#;
    let cfg = FrameConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.snapshot_path, PathBuf::from("state/grid.json"));
    assert_eq!(cfg.on_corrupt_snapshot, SnapshotRecovery::StartEmpty);
    assert!(cfg.render.caption.is_none());
    assert_eq!(cfg.render.canvas.height, 315);
    assert_eq!(cfg.grid_size, 1000);
}

#[test]
fn rejects_bad_geometry_and_unknown_fields() {
    let err = FrameConfig::from_reader(r#"{"token_size": 7}"#.as_bytes()).unwrap_err();
    assert!(matches!(err, PixelFrameError::Validation(_)));
    assert!(FrameConfig::from_reader(r#"{"port": 8080}"#.as_bytes()).is_err());
}

#[test]
fn missing_file_is_validation_error() {
    let err = FrameConfig::from_path("target/no-such-config.json").unwrap_err();
    assert!(err.to_string().contains("open config"));
}

#[test]
fn rejects_oversized_or_invisible_lattices() {
    let err = FrameConfig::from_reader(r#"{"grid_size": 100000, "token_size": 1}"#.as_bytes())
        .unwrap_err();
    assert!(err.to_string().contains("exceeds"));

    let json = r#"{"grid_size": 1000, "token_size": 1, "render": {"canvas": {"width": 600, "height": 315}}}"#;
    let err = FrameConfig::from_reader(json.as_bytes()).unwrap_err();
    assert!(matches!(err, PixelFrameError::Validation(_)));
    assert!(err.to_string().contains("vanish"));

    let json = r#"{"grid_size": 1000, "token_size": 1}"#;
    assert!(FrameConfig::from_reader(json.as_bytes()).is_ok());
}
