// SPDX-License-Identifier: GPL-3.0-only

//! Capture screen state types

use crate::app::controls::CaptureButtonStyle;
use crate::app::preview::PreviewLayer;
use crate::backends::camera::{CameraBackend, CameraDevice, CaptureSession, Facing};
use crate::config::Config;
use crate::constants::PREVIEW_SEGUE;
use crate::pipelines::photo::PendingCapture;
use image::DynamicImage;
use std::sync::Arc;

/// Zoom bounds and the baseline of the active pinch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    /// Zoom factor captured when the current pinch began
    pub scale: f64,
    pub min_scale: f64,
    /// Application ceiling; the device maximum may lower it further
    pub max_scale: f64,
}

impl ZoomState {
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        Self {
            scale: min_scale,
            min_scale,
            max_scale: max_scale.max(min_scale),
        }
    }

    /// Clamp a requested factor to `[min, min(device_max, max)]`
    ///
    /// NaN and non-positive requests end up at the minimum.
    pub fn clamp_factor(&self, factor: f64, device_max: f64) -> f64 {
        let ceiling = device_max.max(self.min_scale).min(self.max_scale);
        factor.max(self.min_scale).min(ceiling)
    }

    /// Normalized position of `factor` between min and max, in `[0, 1]`
    pub fn progress(&self, factor: f64) -> f32 {
        let span = self.max_scale - self.min_scale;
        if span <= 0.0 {
            return 0.0;
        }
        ((factor - self.min_scale) / span).clamp(0.0, 1.0) as f32
    }
}

/// Phase of a pinch gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Possible,
    Began,
    Changed,
    Ended,
    Cancelled,
    Failed,
}

/// One callback of a pinch gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchEvent {
    pub phase: GesturePhase,
    /// Scale relative to the start of the gesture
    pub scale: f64,
}

impl PinchEvent {
    pub fn began() -> Self {
        Self {
            phase: GesturePhase::Began,
            scale: 1.0,
        }
    }

    pub fn changed(scale: f64) -> Self {
        Self {
            phase: GesturePhase::Changed,
            scale,
        }
    }

    pub fn ended(scale: f64) -> Self {
        Self {
            phase: GesturePhase::Ended,
            scale,
        }
    }
}

/// Events delivered to the capture screen
#[derive(Debug, Clone)]
pub enum Message {
    /// Capture button tapped
    CapturePressed,
    /// Flip-facing button tapped
    FlipPressed,
    /// Pinch gesture callback
    Pinch(PinchEvent),
    /// UI tick: pull preview frames and check for a finished capture
    Tick,
}

/// Screen transition requested by the capture screen
#[derive(Debug, Clone)]
pub enum Navigation {
    /// Show the captured image on the preview screen
    Preview { image: DynamicImage },
}

impl Navigation {
    /// Named transition this navigation performs
    pub fn identifier(&self) -> &'static str {
        match self {
            Navigation::Preview { .. } => PREVIEW_SEGUE,
        }
    }
}

/// The capture screen controller
///
/// Owns the capture session and every piece of camera state on the screen.
/// All methods run on the UI thread.
pub struct CaptureScreen {
    pub(crate) config: Config,
    pub(crate) session: CaptureSession,
    pub(crate) back_camera: Option<CameraDevice>,
    pub(crate) front_camera: Option<CameraDevice>,
    pub(crate) current_device: Option<CameraDevice>,
    pub(crate) facing: Facing,
    pub(crate) zoom: ZoomState,
    /// Last factor applied to the device
    pub(crate) zoom_factor: f64,
    pub(crate) zoom_progress: f32,
    pub(crate) pending_capture: Option<PendingCapture>,
    pub(crate) preview_layer: Option<PreviewLayer>,
    pub(crate) capture_button_style: Option<CaptureButtonStyle>,
}

impl CaptureScreen {
    /// Create the screen; nothing touches the camera until [`load`](Self::load)
    pub fn new(backend: Arc<dyn CameraBackend>, config: Config) -> Self {
        let zoom = ZoomState::new(config.min_zoom_factor, config.max_zoom_factor);
        Self {
            session: CaptureSession::new(backend),
            back_camera: None,
            front_camera: None,
            current_device: None,
            facing: config.initial_facing,
            zoom,
            zoom_factor: zoom.min_scale,
            zoom_progress: 0.0,
            pending_capture: None,
            preview_layer: None,
            capture_button_style: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn back_camera(&self) -> Option<&CameraDevice> {
        self.back_camera.as_ref()
    }

    pub fn front_camera(&self) -> Option<&CameraDevice> {
        self.front_camera.as_ref()
    }

    pub fn current_device(&self) -> Option<&CameraDevice> {
        self.current_device.as_ref()
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    /// Value shown by the zoom progress indicator
    pub fn zoom_progress(&self) -> f32 {
        self.zoom_progress
    }

    pub fn is_capture_pending(&self) -> bool {
        self.pending_capture.is_some()
    }

    pub fn preview_layer(&self) -> Option<&PreviewLayer> {
        self.preview_layer.as_ref()
    }

    pub fn preview_layer_mut(&mut self) -> Option<&mut PreviewLayer> {
        self.preview_layer.as_mut()
    }

    pub fn capture_button_style(&self) -> Option<CaptureButtonStyle> {
        self.capture_button_style
    }
}

impl std::fmt::Debug for CaptureScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureScreen")
            .field("session", &self.session)
            .field("current_device", &self.current_device.as_ref().map(|d| &d.name))
            .field("facing", &self.facing)
            .field("zoom_factor", &self.zoom_factor)
            .field("capture_pending", &self.is_capture_pending())
            .finish()
    }
}
