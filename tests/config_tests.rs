// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use snapcam::Config;
use snapcam::app::{VideoGravity, VideoOrientation};
use snapcam::backends::camera::{CameraBackendType, CameraPosition, Facing};
use snapcam::errors::ConfigError;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.min_zoom_factor, 1.0);
    assert_eq!(config.max_zoom_factor, 5.0);
    assert_eq!(config.initial_facing, Facing::Back);
    assert_eq!(config.preview_gravity, VideoGravity::ResizeAspectFill);
    assert_eq!(config.preview_orientation, VideoOrientation::Portrait);
    assert!(config.photo_dir.is_none());
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.backend = CameraBackendType::Synthetic;
    config.max_zoom_factor = 3.0;
    config.initial_facing = Facing::Front;
    config
        .camera_positions
        .insert("/dev/video2".to_string(), CameraPosition::Front);
    config.save(&path).unwrap();

    let loaded = Config::load(Some(&path)).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    match Config::load(Some(&path)) {
        Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_invalid_zoom_ceiling_repaired_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "max_zoom_factor": -2.0 }"#).unwrap();

    let loaded = Config::load(Some(&path)).unwrap();
    assert_eq!(loaded.min_zoom_factor, 1.0);
    assert_eq!(loaded.max_zoom_factor, 5.0);
}
