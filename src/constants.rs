// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application directory name under the config and pictures directories
pub const APP_DIR_NAME: &str = "snapcam";

/// Transition identifier for handing a captured image to the preview screen
pub const PREVIEW_SEGUE: &str = "Preview_Segue";

/// Zoom bounds
pub mod zoom {
    /// Smallest zoom factor (no magnification)
    pub const MIN_FACTOR: f64 = 1.0;

    /// Application zoom ceiling, further capped by the device's hardware maximum
    pub const DEFAULT_MAX_FACTOR: f64 = 5.0;

    /// Gesture scale applied per key press or scroll notch in the terminal
    pub const PINCH_STEP: f64 = 1.1;
}

pub use zoom::DEFAULT_MAX_FACTOR as DEFAULT_MAX_ZOOM_FACTOR;

/// Preview frames buffered between a capture thread and the preview layer
///
/// Frames are dropped when the channel is full.
pub const PREVIEW_CHANNEL_CAPACITY: usize = 2;

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Terminal event poll interval (also the capture completion poll rate)
    pub const UI_TICK: Duration = Duration::from_millis(33);

    /// Time for a headless capture to let the camera deliver frames first
    pub const WARMUP: Duration = Duration::from_millis(500);

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;
}

/// UI Constants
pub mod ui {
    /// Capture button border width
    pub const CAPTURE_BUTTON_BORDER_WIDTH: u16 = 5;

    /// Capture button size in terminal cells (width, height)
    pub const CAPTURE_BUTTON_CELLS: (u16, u16) = (12, 5);

    /// Height of the zoom gauge row
    pub const ZOOM_GAUGE_HEIGHT: u16 = 1;

    /// Height of the status bar
    pub const STATUS_BAR_HEIGHT: u16 = 1;
}
