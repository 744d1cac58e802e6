// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackendType {
    /// Video4Linux2 hardware cameras
    #[default]
    V4l2,
    /// Generated test-pattern cameras (front and back)
    Synthetic,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Where a camera is mounted relative to the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    /// Facing the user
    Front,
    /// Facing away from the user
    Back,
    /// Anything else (USB cameras, capture cards). Ignored by the capture screen.
    External,
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraPosition::Front => write!(f, "front"),
            CameraPosition::Back => write!(f, "back"),
            CameraPosition::External => write!(f, "external"),
        }
    }
}

/// Which of the two screen cameras is selected
///
/// Two-state toggle; both states are equivalent apart from the device they select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Back,
    Front,
}

impl Facing {
    /// The opposite facing
    pub fn toggled(self) -> Self {
        match self {
            Facing::Back => Facing::Front,
            Facing::Front => Facing::Back,
        }
    }

    /// Camera position this facing selects
    pub fn position(self) -> CameraPosition {
        match self {
            Facing::Back => CameraPosition::Back,
            Facing::Front => CameraPosition::Front,
        }
    }
}

/// Capture quality preset applied to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPreset {
    /// Still-photo optimized: the largest frame the device offers
    #[default]
    Photo,
    /// 1280x720 class output
    High,
    /// 640x480 class output
    Low,
}

impl SessionPreset {
    /// Frame size to request from the device; drivers round to the nearest supported size
    pub fn requested_size(self) -> (u32, u32) {
        match self {
            SessionPreset::Photo => (4096, 3072),
            SessionPreset::High => (1280, 720),
            SessionPreset::Low => (640, 480),
        }
    }
}

/// Device information from V4L2 capability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
    /// Bus the device is attached to
    pub bus_info: String,
    /// Real device path (resolved symlinks)
    pub real_path: String,
}

/// Represents a camera device
///
/// Discovered once when the capture screen loads; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    /// Backend-specific identifier (e.g. /dev/video0)
    pub path: String,
    pub position: CameraPosition,
    pub device_info: Option<DeviceInfo>,
}

/// Pixel format for camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit (3 bytes per pixel)
    RGB24,
    /// Gray8 - 8-bit luminance
    Gray8,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    YUYV,
}

impl PixelFormat {
    /// Bytes needed for one row of `width` pixels without padding
    pub fn min_stride(&self, width: u32) -> u32 {
        match self {
            PixelFormat::RGBA => width * 4,
            PixelFormat::RGB24 => width * 3,
            PixelFormat::Gray8 => width,
            PixelFormat::YUYV => width * 2,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Row stride (bytes per row, may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// RGB value at (x, y); coordinates are clamped to the frame
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let data = &self.data;

        match self.format {
            PixelFormat::RGBA => {
                let idx = (y * self.stride + x * 4) as usize;
                if idx + 2 < data.len() {
                    (data[idx], data[idx + 1], data[idx + 2])
                } else {
                    (0, 0, 0)
                }
            }
            PixelFormat::RGB24 => {
                let idx = (y * self.stride + x * 3) as usize;
                if idx + 2 < data.len() {
                    (data[idx], data[idx + 1], data[idx + 2])
                } else {
                    (0, 0, 0)
                }
            }
            PixelFormat::Gray8 => {
                let idx = (y * self.stride + x) as usize;
                match data.get(idx) {
                    Some(&v) => (v, v, v),
                    None => (0, 0, 0),
                }
            }
            PixelFormat::YUYV => {
                // Two pixels share chroma: Y0 U Y1 V
                let pair_x = (x & !1) as usize;
                let base = (y as usize) * (self.stride as usize) + pair_x * 2;
                if base + 3 >= data.len() {
                    return (0, 0, 0);
                }
                let luma = if x & 1 == 0 {
                    data[base]
                } else {
                    data[base + 2]
                };
                yuv_to_rgb(luma, data[base + 1], data[base + 3])
            }
        }
    }

    /// Convert to a packed RGB image for encoding
    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width, self.height, |x, y| {
            let (r, g, b) = self.pixel_rgb(x, y);
            image::Rgb([r, g, b])
        })
    }
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    #[error("Backend not available: {0}")]
    NotAvailable(String),
    /// Camera device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Device is in use by another process or input
    #[error("Device busy: {0}")]
    DeviceBusy(String),
    /// Failed to open or start the device
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
    /// Exclusive configuration access could not be obtained
    #[error("Could not lock device for configuration: {0}")]
    ConfigurationLocked(String),
    /// A device control could not be read or written
    #[error("Control error: {0}")]
    Control(String),
    /// General I/O error
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(err.to_string()),
            std::io::ErrorKind::ResourceBusy => BackendError::DeviceBusy(err.to_string()),
            _ => BackendError::IoError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_round_trip() {
        assert_eq!(Facing::Back.toggled(), Facing::Front);
        assert_eq!(Facing::Back.toggled().toggled(), Facing::Back);
        assert_eq!(Facing::Front.position(), CameraPosition::Front);
    }

    #[test]
    fn test_yuyv_sampling() {
        // Two pixels, mid-grey luma with neutral chroma
        let frame = CameraFrame {
            width: 2,
            height: 1,
            data: Arc::from(vec![100u8, 128, 200, 128]),
            format: PixelFormat::YUYV,
            stride: 4,
            captured_at: Instant::now(),
        };
        assert_eq!(frame.pixel_rgb(0, 0), (100, 100, 100));
        assert_eq!(frame.pixel_rgb(1, 0), (200, 200, 200));
    }

    #[test]
    fn test_pixel_coordinates_clamped() {
        let frame = CameraFrame::from_rgba(1, 1, vec![10, 20, 30, 255]);
        assert_eq!(frame.pixel_rgb(5, 9), (10, 20, 30));
        assert_eq!(frame.to_rgb_image().get_pixel(0, 0).0, [10, 20, 30]);
    }
}
