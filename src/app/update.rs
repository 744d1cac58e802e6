// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The `update()` function is a dispatcher; the handlers live in the
//! `handlers` submodules.
//!
//! # Handler Modules
//!
//! - `handlers::camera`: session setup, device switching, facing toggle
//! - `handlers::capture`: photo capture, completion, zoom

use crate::app::state::{CaptureScreen, Message, Navigation};
use tracing::debug;

impl CaptureScreen {
    /// Main message handler - routes messages to the handler methods
    ///
    /// Refused requests are logged by their handlers; nothing reaches the
    /// user. Returns the screen transition to perform, if any.
    pub fn update(&mut self, message: Message) -> Option<Navigation> {
        match message {
            Message::CapturePressed => {
                if let Err(e) = self.capture_photo() {
                    debug!(error = %e, "Capture request refused");
                }
                None
            }
            Message::FlipPressed => {
                if let Err(e) = self.toggle_facing() {
                    debug!(error = %e, "Camera flip refused");
                }
                None
            }
            Message::Pinch(event) => {
                self.handle_pinch(event);
                None
            }
            Message::Tick => {
                if let Some(layer) = self.preview_layer.as_mut() {
                    layer.drain();
                }
                self.poll_capture()
            }
        }
    }
}
