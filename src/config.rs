// SPDX-License-Identifier: GPL-3.0-only

use crate::app::preview::{VideoGravity, VideoOrientation};
use crate::backends::camera::{CameraBackendType, CameraPosition, Facing, SessionPreset};
use crate::constants::{APP_DIR_NAME, zoom};
use crate::errors::ConfigError;
use crate::pipelines::photo::{EncodingQuality, PhotoCodec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "config.json";

/// Persistent settings, stored as JSON
///
/// Missing fields take their default, so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera backend to use (V4L2 or synthetic)
    pub backend: CameraBackendType,
    /// Smallest zoom factor
    pub min_zoom_factor: f64,
    /// Application zoom ceiling, further capped by the device maximum
    pub max_zoom_factor: f64,
    /// Session quality preset
    pub session_preset: SessionPreset,
    /// Encoding the photo output is prepared for
    pub photo_codec: PhotoCodec,
    pub photo_quality: EncodingQuality,
    /// How the preview fills the screen
    pub preview_gravity: VideoGravity,
    pub preview_orientation: VideoOrientation,
    /// Camera selected when the capture screen loads
    pub initial_facing: Facing,
    /// Where saved photos go; `None` means the pictures directory
    pub photo_dir: Option<PathBuf>,
    /// Camera positions keyed by device path, for hardware that does not report one
    pub camera_positions: HashMap<String, CameraPosition>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            min_zoom_factor: zoom::MIN_FACTOR,
            max_zoom_factor: zoom::DEFAULT_MAX_FACTOR,
            session_preset: SessionPreset::Photo,
            photo_codec: PhotoCodec::Jpeg,
            photo_quality: EncodingQuality::default(),
            preview_gravity: VideoGravity::ResizeAspectFill,
            preview_orientation: VideoOrientation::Portrait,
            initial_facing: Facing::Back,
            photo_dir: None,
            camera_positions: HashMap::new(),
        }
    }
}

impl Config {
    /// Default location: `$XDG_CONFIG_HOME/snapcam/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            debug!("No config directory, using defaults");
            return Ok(Self::default());
        };

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let config: Config = serde_json::from_str(&contents)
            .map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), backend = %config.backend, "Loaded configuration");
        Ok(config.sanitized())
    }

    /// Write to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Repair zoom bounds that would make the zoom range empty
    fn sanitized(mut self) -> Self {
        if !self.min_zoom_factor.is_finite() || self.min_zoom_factor < zoom::MIN_FACTOR {
            self.min_zoom_factor = zoom::MIN_FACTOR;
        }
        if !self.max_zoom_factor.is_finite() || self.max_zoom_factor < self.min_zoom_factor {
            warn!(
                max = self.max_zoom_factor,
                min = self.min_zoom_factor,
                "Invalid zoom ceiling, using default"
            );
            self.max_zoom_factor = zoom::DEFAULT_MAX_FACTOR.max(self.min_zoom_factor);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{ "backend": "synthetic" }"#).unwrap();
        assert_eq!(config.backend, CameraBackendType::Synthetic);
        assert_eq!(config.max_zoom_factor, 5.0);
        assert_eq!(config.photo_codec, PhotoCodec::Jpeg);
    }

    #[test]
    fn test_inverted_zoom_bounds_repaired() {
        let config = Config {
            min_zoom_factor: 0.5,
            max_zoom_factor: 0.2,
            ..Config::default()
        }
        .sanitized();
        assert_eq!(config.min_zoom_factor, 1.0);
        assert_eq!(config.max_zoom_factor, 5.0);
    }
}
