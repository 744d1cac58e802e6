// SPDX-License-Identifier: GPL-3.0-only

//! Camera session handlers
//!
//! Session setup, device discovery, input/output reconfiguration and the
//! front/back toggle.

use crate::app::preview::PreviewLayer;
use crate::app::state::CaptureScreen;
use crate::backends::camera::{CameraDevice, CameraPosition, Facing};
use crate::errors::{ScreenError, ScreenResult};
use crate::pipelines::photo::{PhotoOutput, PhotoSettings};
use tracing::{debug, error, info, warn};

impl CaptureScreen {
    // =========================================================================
    // Screen Load
    // =========================================================================

    /// Bring the screen up: session, devices, preview, running session, chrome
    pub fn load(&mut self) {
        info!("Loading capture screen");
        self.setup_capture_session();
        self.setup_devices();
        self.setup_preview_layer();
        self.session.start_running();
        self.style_capture_button();
    }

    /// Configure the session for still photos
    pub(crate) fn setup_capture_session(&mut self) {
        self.session.set_preset(self.config.session_preset);
    }

    /// Discover front and back cameras and select the initial one
    ///
    /// External cameras are ignored. When several devices share a facing the
    /// last one enumerated is kept.
    pub(crate) fn setup_devices(&mut self) {
        let cameras = self.session.backend().enumerate_cameras();
        debug!(count = cameras.len(), "Enumerated cameras");

        for device in cameras {
            match device.position {
                CameraPosition::Back => self.back_camera = Some(device),
                CameraPosition::Front => self.front_camera = Some(device),
                CameraPosition::External => {
                    debug!(device = %device.name, "Ignoring external camera");
                }
            }
        }

        if self.back_camera.is_none() {
            warn!("No back camera found");
        }
        if self.front_camera.is_none() {
            warn!("No front camera found");
        }

        let device = self.device_for(self.facing).cloned();
        self.set_current_device(device);
    }

    /// Bind a preview layer to the session's frame channel
    pub(crate) fn setup_preview_layer(&mut self) {
        let Some(receiver) = self.session.take_preview_receiver() else {
            debug!("Preview layer already bound");
            return;
        };
        self.preview_layer = Some(PreviewLayer::new(
            receiver,
            self.config.preview_gravity,
            self.config.preview_orientation,
        ));
    }

    fn device_for(&self, facing: Facing) -> Option<&CameraDevice> {
        match facing {
            Facing::Back => self.back_camera.as_ref(),
            Facing::Front => self.front_camera.as_ref(),
        }
    }

    // =========================================================================
    // Device Switching
    // =========================================================================

    /// Make `device` current: stop, reconfigure input/output, start
    pub fn set_current_device(&mut self, device: Option<CameraDevice>) {
        info!(
            device = device.as_ref().map(|d| d.name.as_str()).unwrap_or("none"),
            "Setting current device"
        );
        self.current_device = device;

        self.session.stop_running();
        self.setup_input_output();
        self.session.start_running();
    }

    /// Replace the session input and photo output for the current device
    ///
    /// If the new input cannot be constructed the failure is logged and the
    /// session keeps whatever it had.
    pub(crate) fn setup_input_output(&mut self) {
        let Some(device) = self.current_device.as_ref() else {
            warn!("No current device, session left without input");
            return;
        };

        let input = match self.session.make_input(device) {
            Ok(input) => input,
            Err(e) => {
                error!(error = %e, device = %device.name, "Failed to create device input");
                return;
            }
        };

        self.session.remove_input();
        if self.session.can_add_input() {
            self.session.add_input(input);
        }

        let mut output = PhotoOutput::new();
        output.set_prepared_photo_settings(vec![PhotoSettings::with_codec(
            self.config.photo_codec,
        )]);
        self.session.remove_output();
        self.session.add_output(output);

        if let Some(layer) = self.preview_layer.as_mut() {
            layer.clear();
        }
    }

    /// Flip between the front and back camera
    ///
    /// Refused while a capture is pending, and when the other facing has no
    /// camera; the current device is unchanged in both cases.
    pub fn toggle_facing(&mut self) -> ScreenResult<()> {
        if self.pending_capture.is_some() {
            warn!("Ignoring camera flip while a capture is pending");
            return Err(ScreenError::CaptureInProgress);
        }

        let facing = self.facing.toggled();
        let Some(device) = self.device_for(facing).cloned() else {
            warn!(position = %facing.position(), "No camera for facing");
            return Err(ScreenError::NoDevice(facing.position()));
        };

        self.facing = facing;
        info!(?facing, "Toggled camera facing");
        self.set_current_device(Some(device));
        Ok(())
    }
}
