// SPDX-License-Identifier: GPL-3.0-only

//! Capture operations handlers
//!
//! Handles photo capture, its completion, and pinch-to-zoom.

use crate::app::state::{CaptureScreen, GesturePhase, Navigation, PinchEvent};
use crate::errors::{PhotoResult, ScreenError, ScreenResult};
use crate::pipelines::photo::{CapturedPhoto, PhotoSettings};
use tracing::{debug, error, info, warn};

impl CaptureScreen {
    // =========================================================================
    // Photo Capture
    // =========================================================================

    /// Issue one capture request with default settings
    ///
    /// Only one request may be outstanding at a time.
    pub fn capture_photo(&mut self) -> ScreenResult<()> {
        if self.pending_capture.is_some() {
            debug!("Capture already pending");
            return Err(ScreenError::CaptureInProgress);
        }
        if self.current_device.is_none() {
            warn!(facing = ?self.facing, "Capture requested without a camera");
            return Err(ScreenError::NoDevice(self.facing.position()));
        }
        let Some(output) = self.session.output() else {
            warn!("Capture requested without a photo output");
            return Err(ScreenError::NoPhotoOutput);
        };

        let settings = PhotoSettings {
            codec: self.config.photo_codec,
            quality: self.config.photo_quality,
        };
        let pending = output.capture_photo(settings)?;
        self.pending_capture = Some(pending);
        Ok(())
    }

    /// Check for a finished capture without blocking
    ///
    /// Returns the navigation to perform when the capture produced an image.
    pub fn poll_capture(&mut self) -> Option<Navigation> {
        let result = self.pending_capture.as_mut()?.try_complete()?;
        self.pending_capture = None;
        self.handle_capture_completed(result)
    }

    /// Block until the pending capture finishes
    ///
    /// For headless callers; must not be called from an async context.
    pub fn wait_for_capture(&mut self) -> Option<Navigation> {
        let pending = self.pending_capture.take()?;
        self.handle_capture_completed(pending.wait())
    }

    /// Turn a capture result into a navigation to the preview screen
    ///
    /// Failures and captures without data are logged and produce nothing.
    pub(crate) fn handle_capture_completed(
        &mut self,
        result: PhotoResult<CapturedPhoto>,
    ) -> Option<Navigation> {
        let photo = match result {
            Ok(photo) => photo,
            Err(e) => {
                error!(error = %e, "Photo capture failed");
                return None;
            }
        };

        let Some(data) = photo.file_data_representation() else {
            debug!("Capture completed without image data");
            return None;
        };

        match image::load_from_memory(data) {
            Ok(image) => {
                info!(
                    width = image.width(),
                    height = image.height(),
                    "Photo captured"
                );
                Some(Navigation::Preview { image })
            }
            Err(e) => {
                error!(error = %e, "Captured data could not be decoded");
                None
            }
        }
    }

    // =========================================================================
    // Zoom
    // =========================================================================

    /// Apply one pinch gesture callback
    ///
    /// The device configuration lock is held only for the duration of this
    /// call and released on every path. Lock and apply failures are logged
    /// and the update skipped.
    pub fn handle_pinch(&mut self, event: PinchEvent) {
        let Some(device) = self.current_device.as_ref() else {
            debug!("Pinch without a current device");
            return;
        };

        let mut configuration = match self.session.backend().lock_for_configuration(device) {
            Ok(configuration) => configuration,
            Err(e) => {
                warn!(error = %e, device = %device.name, "Failed to lock device for zoom");
                return;
            }
        };

        match event.phase {
            GesturePhase::Began => {
                self.zoom.scale = configuration.video_zoom_factor();
                debug!(baseline = self.zoom.scale, "Pinch began");
            }
            GesturePhase::Changed => {
                let factor = self.zoom.clamp_factor(
                    self.zoom.scale * event.scale,
                    configuration.max_video_zoom_factor(),
                );
                match configuration.set_video_zoom_factor(factor) {
                    Ok(()) => {
                        self.zoom_factor = factor;
                        self.zoom_progress = self.zoom.progress(factor);
                        debug!(factor, progress = self.zoom_progress, "Zoom applied");
                    }
                    Err(e) => warn!(error = %e, factor, "Failed to apply zoom"),
                }
            }
            GesturePhase::Possible
            | GesturePhase::Ended
            | GesturePhase::Cancelled
            | GesturePhase::Failed => {}
        }
    }
}
