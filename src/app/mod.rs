// SPDX-License-Identifier: MPL-2.0

//! Capture screen and preview screen
//!
//! # Architecture
//!
//! - `state`: Screen state types (CaptureScreen, Message, Navigation, ZoomState)
//! - `handlers`: Camera session and capture handlers
//! - `update`: Message dispatch
//! - `preview`: Live preview layer
//! - `controls`: Capture button styling
//! - `preview_screen`: Screen receiving the captured image
//!
//! # Main Types
//!
//! - `CaptureScreen`: Owns the capture session and all camera state
//! - `Message`: User interactions and UI ticks
//! - `Navigation`: Transition to the preview screen

pub mod controls;
mod handlers;
pub mod preview;
pub mod preview_screen;
mod state;
mod update;

pub use controls::{CaptureButton, CaptureButtonStyle};
pub use preview::{LayerFrame, PreviewLayer, VideoGravity, VideoOrientation};
pub use preview_screen::PreviewScreen;
pub use state::{CaptureScreen, GesturePhase, Message, Navigation, PinchEvent, ZoomState};
