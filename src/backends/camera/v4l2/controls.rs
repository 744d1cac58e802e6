// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capability and control ioctls
//!
//! Only what the capture screen needs: device capability queries for
//! discovery and the absolute zoom control for pinch-to-zoom.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use tracing::{debug, warn};

// ===== V4L2 Control IDs =====

const V4L2_CTRL_CLASS_CAMERA: u32 = 0x009a0000;
const V4L2_CID_CAMERA_CLASS_BASE: u32 = V4L2_CTRL_CLASS_CAMERA | 0x900;

/// Absolute zoom position
pub const V4L2_CID_ZOOM_ABSOLUTE: u32 = V4L2_CID_CAMERA_CLASS_BASE + 13;

// ===== V4L2 Capability Flags =====

/// Device supports single-planar video capture
pub const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x0000_0001;
/// `device_caps` field is valid
const V4L2_CAP_DEVICE_CAPS: u32 = 0x8000_0000;

// ===== V4L2 Control Flags =====
const V4L2_CTRL_FLAG_DISABLED: u32 = 0x0001;

// ===== V4L2 ioctl Numbers =====

/// Query capabilities (v4l2_capability: 104 bytes)
const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;
/// Get control value (v4l2_control: 8 bytes)
const VIDIOC_G_CTRL: libc::c_ulong = 0xC008561B;
/// Set control value (v4l2_control: 8 bytes)
const VIDIOC_S_CTRL: libc::c_ulong = 0xC008561C;
/// Query control info (v4l2_queryctrl: 68 bytes)
const VIDIOC_QUERYCTRL: libc::c_ulong = 0xC0445624;

// ===== V4L2 ioctl Structures =====

#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

#[repr(C)]
struct V4l2Control {
    id: u32,
    value: i32,
}

#[repr(C)]
struct V4l2Queryctrl {
    id: u32,
    ctrl_type: u32,
    name: [u8; 32],
    minimum: i32,
    maximum: i32,
    step: i32,
    default_value: i32,
    flags: u32,
    reserved: [u32; 2],
}

// ===== Public Types =====

/// Identity and capabilities reported by VIDIOC_QUERYCAP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub driver: String,
    pub card: String,
    pub bus_info: String,
    /// Capabilities of this particular device node
    pub device_caps: u32,
}

impl Capabilities {
    pub fn is_video_capture(&self) -> bool {
        self.device_caps & V4L2_CAP_VIDEO_CAPTURE != 0
    }
}

/// Range of an integer control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRange {
    pub minimum: i32,
    pub maximum: i32,
    pub step: i32,
    pub default_value: i32,
}

/// Extract a null-terminated string from a fixed-size byte array
fn extract_name(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).to_string()
}

// ===== Public Functions =====

/// Query capabilities of a device node
pub fn query_capabilities(device_path: &str) -> Option<Capabilities> {
    let file = File::open(device_path).ok()?;
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            VIDIOC_QUERYCAP as _,
            &mut cap as *mut V4l2Capability,
        )
    };
    if result < 0 {
        debug!(device_path, "VIDIOC_QUERYCAP failed");
        return None;
    }

    // Older drivers only fill the device-wide field
    let device_caps = if cap.capabilities & V4L2_CAP_DEVICE_CAPS != 0 {
        cap.device_caps
    } else {
        cap.capabilities
    };

    Some(Capabilities {
        driver: extract_name(&cap.driver),
        card: extract_name(&cap.card),
        bus_info: extract_name(&cap.bus_info),
        device_caps,
    })
}

/// Query the range of a control on an open device, `None` if absent or disabled
pub fn query_control_range(file: &File, control_id: u32) -> Option<ControlRange> {
    let mut qctrl = V4l2Queryctrl {
        id: control_id,
        ctrl_type: 0,
        name: [0; 32],
        minimum: 0,
        maximum: 0,
        step: 0,
        default_value: 0,
        flags: 0,
        reserved: [0; 2],
    };

    let result = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            VIDIOC_QUERYCTRL as _,
            &mut qctrl as *mut V4l2Queryctrl,
        )
    };
    if result < 0 || qctrl.flags & V4L2_CTRL_FLAG_DISABLED != 0 {
        return None;
    }

    Some(ControlRange {
        minimum: qctrl.minimum,
        maximum: qctrl.maximum,
        step: qctrl.step.max(1),
        default_value: qctrl.default_value,
    })
}

/// Get current value of a control
pub fn get_control(file: &File, control_id: u32) -> Option<i32> {
    let mut ctrl = V4l2Control {
        id: control_id,
        value: 0,
    };

    let result = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            VIDIOC_G_CTRL as _,
            &mut ctrl as *mut V4l2Control,
        )
    };
    if result < 0 {
        debug!(control_id, "Failed to get V4L2 control");
        return None;
    }

    Some(ctrl.value)
}

/// Set value of a control
pub fn set_control(file: &File, control_id: u32, value: i32) -> std::io::Result<()> {
    let mut ctrl = V4l2Control {
        id: control_id,
        value,
    };

    let result = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            VIDIOC_S_CTRL as _,
            &mut ctrl as *mut V4l2Control,
        )
    };
    if result < 0 {
        let errno = std::io::Error::last_os_error();
        warn!(control_id, value, ?errno, "Failed to set V4L2 control");
        return Err(errno);
    }

    if ctrl.value != value {
        debug!(
            control_id,
            requested = value,
            actual = ctrl.value,
            "V4L2 control value was clamped"
        );
    }

    Ok(())
}

/// Map between zoom factors and a zoom control's integer range
///
/// UVC cameras conventionally report zoom positions where the minimum is
/// 1x (e.g. 100..=500 for 1x..5x), so a positive minimum gives a hardware
/// ceiling of `maximum / minimum`. Ranges starting at zero are mapped
/// linearly onto `1..=fallback_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomMapping {
    pub range: ControlRange,
    pub max_factor: f64,
}

impl ZoomMapping {
    pub fn new(range: ControlRange, fallback_max: f64) -> Self {
        let max_factor = if range.maximum <= range.minimum {
            1.0
        } else if range.minimum > 0 {
            range.maximum as f64 / range.minimum as f64
        } else {
            fallback_max
        };
        Self {
            range,
            max_factor: max_factor.max(1.0),
        }
    }

    /// Zoom factor for a control value
    pub fn factor_for(&self, value: i32) -> f64 {
        let span = self.span();
        if span <= 0.0 {
            return 1.0;
        }
        let t = ((i64::from(value) - i64::from(self.range.minimum)) as f64 / span).clamp(0.0, 1.0);
        1.0 + t * (self.max_factor - 1.0)
    }

    /// Control value for a zoom factor, snapped to the control step
    pub fn value_for(&self, factor: f64) -> i32 {
        if self.max_factor <= 1.0 {
            return self.range.minimum;
        }
        let t = ((factor - 1.0) / (self.max_factor - 1.0)).clamp(0.0, 1.0);
        let span = self.span();
        let raw = self.range.minimum as f64 + t * span;
        let step = self.range.step as f64;
        let snapped = self.range.minimum as f64 + ((raw - self.range.minimum as f64) / step).round() * step;
        (snapped as i64).clamp(i64::from(self.range.minimum), i64::from(self.range.maximum)) as i32
    }

    /// Width of the control range, computed without `i32` overflow
    fn span(&self) -> f64 {
        (i64::from(self.range.maximum) - i64::from(self.range.minimum)) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(minimum: i32, maximum: i32, step: i32) -> ControlRange {
        ControlRange {
            minimum,
            maximum,
            step,
            default_value: minimum,
        }
    }

    #[test]
    fn test_control_id_values() {
        assert_eq!(V4L2_CID_ZOOM_ABSOLUTE, 0x009a090d);
    }

    #[test]
    fn test_uvc_style_zoom_range() {
        let mapping = ZoomMapping::new(range(100, 500, 1), 5.0);
        assert_eq!(mapping.max_factor, 5.0);
        assert_eq!(mapping.factor_for(100), 1.0);
        assert_eq!(mapping.factor_for(500), 5.0);
        assert_eq!(mapping.value_for(4.0), 400);
    }

    #[test]
    fn test_zero_based_zoom_range() {
        let mapping = ZoomMapping::new(range(0, 10, 2), 5.0);
        assert_eq!(mapping.max_factor, 5.0);
        assert_eq!(mapping.value_for(1.0), 0);
        assert_eq!(mapping.value_for(5.0), 10);
        // 2.0x is 2.5 raw, snapped to an even step
        assert_eq!(mapping.value_for(2.0) % 2, 0);
    }

    #[test]
    fn test_full_i32_range_does_not_overflow() {
        let mapping = ZoomMapping::new(range(i32::MIN, i32::MAX, 1), 5.0);
        assert_eq!(mapping.max_factor, 5.0);
        assert_eq!(mapping.factor_for(i32::MIN), 1.0);
        assert_eq!(mapping.factor_for(i32::MAX), 5.0);
        assert_eq!(mapping.value_for(1.0), i32::MIN);
        assert_eq!(mapping.value_for(5.0), i32::MAX);
    }

    #[test]
    fn test_degenerate_range() {
        let mapping = ZoomMapping::new(range(3, 3, 1), 5.0);
        assert_eq!(mapping.max_factor, 1.0);
        assert_eq!(mapping.factor_for(3), 1.0);
        assert_eq!(mapping.value_for(2.0), 3);
    }
}
