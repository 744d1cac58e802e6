// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! The capture screen talks to camera hardware only through the traits in
//! this module.
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureScreen     │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   CaptureSession    │  ← input/output wiring, start/stop
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← discovery, inputs, configuration lock
//! └──────────┬──────────┘
//!            │
//!       ┌────┴──────┐
//!       ▼           ▼
//!   ┌──────┐  ┌───────────┐
//!   │ V4L2 │  │ Synthetic │
//!   └──────┘  └───────────┘
//! ```

pub mod session;
pub mod synthetic;
#[cfg(all(feature = "v4l2", target_os = "linux"))]
pub mod v4l2;
pub mod types;

pub use session::CaptureSession;
pub use synthetic::{SyntheticBackend, SyntheticEvent, SyntheticOptions};
pub use types::*;

use std::collections::HashMap;
use std::sync::Arc;

/// Camera framework entry point
///
/// A backend discovers devices, constructs session inputs for them and grants
/// exclusive configuration access for device controls such as zoom.
pub trait CameraBackend: Send + Sync {
    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Check if this backend is usable on the current system
    fn is_available(&self) -> bool;

    /// Enumerate available cameras
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Construct a session input for `device`
    ///
    /// Fails when the device is busy, gone, or cannot be opened. Constructing
    /// an input does not start streaming.
    fn open_input(
        &self,
        device: &CameraDevice,
        preset: SessionPreset,
    ) -> BackendResult<Box<dyn DeviceInput>>;

    /// Acquire exclusive configuration access to `device`
    ///
    /// Access is released when the returned guard is dropped.
    fn lock_for_configuration(
        &self,
        device: &CameraDevice,
    ) -> BackendResult<Box<dyn DeviceConfiguration>>;
}

/// A device attached to a capture session as its input
pub trait DeviceInput: Send {
    /// The device this input reads from
    fn device(&self) -> &CameraDevice;

    /// Start streaming preview frames into `preview`
    ///
    /// Returns once streaming has been requested, not when the first frame
    /// has arrived.
    fn start(&mut self, preview: FrameSender) -> BackendResult<()>;

    /// Stop streaming. Does nothing if not streaming.
    fn stop(&mut self);

    fn is_streaming(&self) -> bool;

    /// Source the photo output pulls still frames from
    fn still_source(&self) -> Arc<dyn StillSource>;
}

/// Produces one still frame per request
pub trait StillSource: Send + Sync {
    /// Grab a still frame
    ///
    /// `Ok(None)` means the device answered without image data.
    fn capture_still(&self) -> BackendResult<Option<CameraFrame>>;
}

/// Exclusive configuration access to one device
///
/// Dropping the value releases the lock.
pub trait DeviceConfiguration {
    /// Current zoom factor (1.0 = no zoom)
    fn video_zoom_factor(&self) -> f64;

    /// Largest zoom factor the hardware supports (always >= 1.0)
    fn max_video_zoom_factor(&self) -> f64;

    /// Apply a zoom factor
    fn set_video_zoom_factor(&mut self, factor: f64) -> BackendResult<()>;
}

/// Get a backend instance for the given type
///
/// `position_overrides` maps device paths to positions for hardware whose
/// facing cannot be detected.
pub fn get_backend_for_type(
    backend_type: CameraBackendType,
    position_overrides: &HashMap<String, CameraPosition>,
) -> Arc<dyn CameraBackend> {
    match backend_type {
        CameraBackendType::Synthetic => Arc::new(SyntheticBackend::new(SyntheticOptions::default())),
        CameraBackendType::V4l2 => v4l2_backend(position_overrides),
    }
}

#[cfg(all(feature = "v4l2", target_os = "linux"))]
fn v4l2_backend(position_overrides: &HashMap<String, CameraPosition>) -> Arc<dyn CameraBackend> {
    Arc::new(v4l2::V4l2Backend::new(position_overrides.clone()))
}

#[cfg(not(all(feature = "v4l2", target_os = "linux")))]
fn v4l2_backend(_position_overrides: &HashMap<String, CameraPosition>) -> Arc<dyn CameraBackend> {
    tracing::warn!("V4L2 support not compiled in, using synthetic cameras");
    Arc::new(SyntheticBackend::new(SyntheticOptions::default()))
}
