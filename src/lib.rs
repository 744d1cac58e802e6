// SPDX-License-Identifier: MPL-2.0

//! snapcam - a single-screen camera capture controller
//!
//! A capture screen drives a camera session: live preview, front/back
//! switching, pinch-to-zoom and still capture. A captured photo is handed to
//! the preview screen through the `"Preview_Segue"` transition.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Capture screen controller, preview layer and preview screen
//! - [`backends`]: Camera backend abstraction (V4L2 and synthetic)
//! - [`pipelines`]: Photo output and encoding
//! - [`terminal`]: Terminal front end
//! - [`config`]: User configuration handling
//! - [`storage`]: Saving photos
//!
//! # Example
//!
//! ```no_run
//! use snapcam::backends::camera::SyntheticBackend;
//! use snapcam::{CaptureScreen, Config, Message};
//! use std::sync::Arc;
//!
//! let mut screen = CaptureScreen::new(Arc::new(SyntheticBackend::default()), Config::default());
//! screen.load();
//! screen.update(Message::CapturePressed);
//! if let Some(navigation) = screen.wait_for_capture() {
//!     println!("{}", navigation.identifier());
//! }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{CaptureScreen, Message, Navigation, PinchEvent, PreviewScreen};
pub use config::Config;
pub use errors::{AppError, AppResult};
