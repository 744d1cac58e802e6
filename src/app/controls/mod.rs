// SPDX-License-Identifier: MPL-2.0

//! Capture controls module
//!
//! Styling and terminal rendering of the capture button.

pub mod capture_button;

pub use capture_button::{CaptureButton, CaptureButtonStyle};
