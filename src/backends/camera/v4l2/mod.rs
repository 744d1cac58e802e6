// SPDX-License-Identifier: GPL-3.0-only

//! Video4Linux2 camera backend
//!
//! Discovers `/dev/video*` capture nodes, streams them through the `v4l`
//! crate and drives zoom through `V4L2_CID_ZOOM_ABSOLUTE`.
//!
//! V4L2 does not report which way a camera faces, so the position is guessed
//! from the card name and can be overridden per device path in the config.

pub mod capture;
pub mod controls;

use super::types::*;
use super::{CameraBackend, DeviceConfiguration, DeviceInput, StillSource};
use crate::constants::DEFAULT_MAX_ZOOM_FACTOR;
use capture::{LatestFrame, V4l2Pipeline};
use controls::{V4L2_CID_ZOOM_ABSOLUTE, ZoomMapping};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Backend for V4L2 capture devices
#[derive(Debug, Clone, Default)]
pub struct V4l2Backend {
    position_overrides: HashMap<String, CameraPosition>,
    locks: ConfigurationLocks,
}

impl V4l2Backend {
    pub fn new(position_overrides: HashMap<String, CameraPosition>) -> Self {
        Self {
            position_overrides,
            locks: ConfigurationLocks::default(),
        }
    }

    fn position_for(&self, path: &str, card: &str) -> CameraPosition {
        self.position_overrides
            .get(path)
            .copied()
            .unwrap_or_else(|| classify_position(card))
    }
}

/// Guess a camera position from its card name
pub fn classify_position(card: &str) -> CameraPosition {
    let card = card.to_lowercase();
    const FRONT: [&str; 4] = ["front", "user", "integrated", "internal"];
    const BACK: [&str; 4] = ["back", "rear", "world", "environment"];

    if FRONT.iter().any(|hint| card.contains(hint)) {
        CameraPosition::Front
    } else if BACK.iter().any(|hint| card.contains(hint)) {
        CameraPosition::Back
    } else {
        CameraPosition::External
    }
}

/// Device paths currently held for configuration within this process
///
/// V4L2 itself has no exclusive control access, so exclusivity is enforced
/// between the guards this backend hands out.
#[derive(Debug, Clone, Default)]
struct ConfigurationLocks {
    held: Arc<Mutex<HashSet<String>>>,
}

impl ConfigurationLocks {
    fn held(&self) -> MutexGuard<'_, HashSet<String>> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim `path`, failing if another guard holds it
    fn acquire(&self, path: &str) -> BackendResult<PathLock> {
        if !self.held().insert(path.to_string()) {
            return Err(BackendError::ConfigurationLocked(format!(
                "{} is already locked",
                path
            )));
        }
        Ok(PathLock {
            path: path.to_string(),
            locks: self.clone(),
        })
    }
}

/// Claim on one device path, released on drop
struct PathLock {
    path: String,
    locks: ConfigurationLocks,
}

impl Drop for PathLock {
    fn drop(&mut self) {
        self.locks.held().remove(&self.path);
    }
}

/// `/dev/video*` nodes, sorted by index
fn video_nodes() -> Vec<String> {
    let mut nodes: Vec<(u32, String)> = std::fs::read_dir("/dev")
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let index = name.strip_prefix("video")?.parse::<u32>().ok()?;
            Some((index, entry.path().to_string_lossy().to_string()))
        })
        .collect();
    nodes.sort();
    nodes.into_iter().map(|(_, path)| path).collect()
}

impl CameraBackend for V4l2Backend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }

    fn is_available(&self) -> bool {
        !video_nodes().is_empty()
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut cameras = Vec::new();

        for path in video_nodes() {
            let Some(caps) = controls::query_capabilities(&path) else {
                continue;
            };
            // Metadata nodes share the card name but cannot capture
            if !caps.is_video_capture() {
                debug!(path = %path, card = %caps.card, "Skipping non-capture node");
                continue;
            }

            let position = self.position_for(&path, &caps.card);
            let real_path = std::fs::canonicalize(&path)
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|_| path.clone());

            info!(path = %path, card = %caps.card, %position, "Found V4L2 camera");
            cameras.push(CameraDevice {
                name: caps.card.clone(),
                path: path.clone(),
                position,
                device_info: Some(DeviceInfo {
                    card: caps.card,
                    driver: caps.driver,
                    bus_info: caps.bus_info,
                    real_path,
                }),
            });
        }

        cameras
    }

    fn open_input(
        &self,
        device: &CameraDevice,
        preset: SessionPreset,
    ) -> BackendResult<Box<dyn DeviceInput>> {
        // Probe the node so a vanished or inaccessible device fails here
        File::options()
            .read(true)
            .write(true)
            .open(&device.path)?;

        Ok(Box::new(V4l2Input {
            device: device.clone(),
            preset,
            pipeline: None,
            latest: Arc::new(Mutex::new(None)),
        }))
    }

    fn lock_for_configuration(
        &self,
        device: &CameraDevice,
    ) -> BackendResult<Box<dyn DeviceConfiguration>> {
        let lock = self.locks.acquire(&device.path)?;
        let file = File::options()
            .read(true)
            .write(true)
            .open(&device.path)
            .map_err(|e| BackendError::ConfigurationLocked(format!("{}: {}", device.path, e)))?;

        let zoom = controls::query_control_range(&file, V4L2_CID_ZOOM_ABSOLUTE)
            .map(|range| ZoomMapping::new(range, DEFAULT_MAX_ZOOM_FACTOR));
        if zoom.is_none() {
            debug!(device = %device.name, "Device has no zoom control");
        }

        Ok(Box::new(V4l2Configuration { lock, file, zoom }))
    }
}

/// Session input for a V4L2 device
struct V4l2Input {
    device: CameraDevice,
    preset: SessionPreset,
    pipeline: Option<V4l2Pipeline>,
    latest: LatestFrame,
}

impl DeviceInput for V4l2Input {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn start(&mut self, preview: FrameSender) -> BackendResult<()> {
        if self.is_streaming() {
            return Ok(());
        }
        let pipeline = V4l2Pipeline::start(
            &self.device.path,
            self.preset,
            preview,
            Arc::clone(&self.latest),
        )?;
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.stop();
        }
        if let Ok(mut latest) = self.latest.lock() {
            *latest = None;
        }
    }

    fn is_streaming(&self) -> bool {
        self.pipeline
            .as_ref()
            .map(|p| p.is_running())
            .unwrap_or(false)
    }

    fn still_source(&self) -> Arc<dyn StillSource> {
        Arc::new(V4l2StillSource {
            latest: Arc::clone(&self.latest),
        })
    }
}

impl Drop for V4l2Input {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Stills come from the most recent streamed frame
struct V4l2StillSource {
    latest: LatestFrame,
}

impl StillSource for V4l2StillSource {
    fn capture_still(&self) -> BackendResult<Option<CameraFrame>> {
        let latest = self
            .latest
            .lock()
            .map_err(|_| BackendError::IoError("capture thread panicked".to_string()))?;
        Ok(latest.clone())
    }
}

/// Configuration guard holding the device open read/write
struct V4l2Configuration {
    lock: PathLock,
    file: File,
    zoom: Option<ZoomMapping>,
}

impl DeviceConfiguration for V4l2Configuration {
    fn video_zoom_factor(&self) -> f64 {
        match self.zoom {
            Some(mapping) => controls::get_control(&self.file, V4L2_CID_ZOOM_ABSOLUTE)
                .map(|value| mapping.factor_for(value))
                .unwrap_or(1.0),
            None => 1.0,
        }
    }

    fn max_video_zoom_factor(&self) -> f64 {
        self.zoom.map(|m| m.max_factor).unwrap_or(1.0)
    }

    fn set_video_zoom_factor(&mut self, factor: f64) -> BackendResult<()> {
        let Some(mapping) = self.zoom else {
            if factor > 1.0 {
                warn!(path = %self.lock.path, factor, "Zoom requested on a device without zoom control");
            }
            return Ok(());
        };
        let value = mapping.value_for(factor);
        controls::set_control(&self.file, V4L2_CID_ZOOM_ABSOLUTE, value)
            .map_err(|e| BackendError::Control(format!("zoom: {}", e)))
    }
}

impl Drop for V4l2Configuration {
    fn drop(&mut self) {
        debug!(path = %self.lock.path, "Released V4L2 configuration");
    }
}
