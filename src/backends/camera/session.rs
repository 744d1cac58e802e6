// SPDX-License-Identifier: GPL-3.0-only

//! Capture session
//!
//! The session wires one device input and one photo output together and owns
//! the preview frame channel. It is owned by the capture screen and mutated
//! only from the UI thread.
//!
//! Starting and stopping only request the change from the input; they return
//! before the hardware has actually started or quiesced.

use super::types::*;
use super::{CameraBackend, DeviceInput};
use crate::constants::PREVIEW_CHANNEL_CAPACITY;
use crate::pipelines::photo::PhotoOutput;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Camera capture session
pub struct CaptureSession {
    backend: Arc<dyn CameraBackend>,
    preset: SessionPreset,
    input: Option<Box<dyn DeviceInput>>,
    output: Option<PhotoOutput>,
    running: bool,
    preview_sender: FrameSender,
    preview_receiver: Option<FrameReceiver>,
}

impl CaptureSession {
    /// Create an empty, stopped session on `backend`
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        info!(backend = %backend.backend_type(), "Creating capture session");
        let (preview_sender, preview_receiver) =
            futures::channel::mpsc::channel(PREVIEW_CHANNEL_CAPACITY);

        Self {
            backend,
            preset: SessionPreset::default(),
            input: None,
            output: None,
            running: false,
            preview_sender,
            preview_receiver: Some(preview_receiver),
        }
    }

    pub fn backend(&self) -> &Arc<dyn CameraBackend> {
        &self.backend
    }

    /// Set the quality preset used for inputs created afterwards
    pub fn set_preset(&mut self, preset: SessionPreset) {
        debug!(?preset, "Session preset");
        self.preset = preset;
    }

    pub fn preset(&self) -> SessionPreset {
        self.preset
    }

    /// Construct an input for `device` without attaching it
    pub fn make_input(&self, device: &CameraDevice) -> BackendResult<Box<dyn DeviceInput>> {
        self.backend.open_input(device, self.preset)
    }

    /// Device of the attached input
    pub fn input_device(&self) -> Option<&CameraDevice> {
        self.input.as_ref().map(|input| input.device())
    }

    pub fn can_add_input(&self) -> bool {
        self.input.is_none()
    }

    /// Detach and stop the current input, if any
    pub fn remove_input(&mut self) {
        if let Some(mut input) = self.input.take() {
            info!(device = %input.device().name, "Removing session input");
            input.stop();
            if let Some(output) = self.output.as_mut() {
                output.disconnect();
            }
        }
    }

    /// Attach `input`, stopping any input it replaces
    ///
    /// The attached output is connected to the new input. A running session
    /// starts streaming the input immediately; a start failure is logged and
    /// the input stays attached.
    pub fn add_input(&mut self, mut input: Box<dyn DeviceInput>) {
        info!(device = %input.device().name, "Adding session input");

        if let Some(output) = self.output.as_mut() {
            output.connect(input.still_source());
        }
        if self.running {
            if let Err(e) = input.start(self.preview_sender.clone()) {
                error!(error = %e, device = %input.device().name, "Failed to start input");
            }
        }
        if let Some(mut previous) = self.input.replace(input) {
            previous.stop();
        }
    }

    pub fn output(&self) -> Option<&PhotoOutput> {
        self.output.as_ref()
    }

    pub fn remove_output(&mut self) {
        if self.output.take().is_some() {
            debug!("Removed photo output");
        }
    }

    /// Attach a photo output, connecting it to the current input
    pub fn add_output(&mut self, mut output: PhotoOutput) {
        if let Some(input) = self.input.as_ref() {
            output.connect(input.still_source());
        }
        debug!(connected = output.is_connected(), "Added photo output");
        self.output = Some(output);
    }

    /// Start streaming the attached input
    pub fn start_running(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        info!("Starting capture session");

        if let Some(input) = self.input.as_mut() {
            if let Err(e) = input.start(self.preview_sender.clone()) {
                error!(error = %e, device = %input.device().name, "Failed to start input");
            }
        }
    }

    /// Stop streaming; attached input and output stay in place
    pub fn stop_running(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        info!("Stopping capture session");

        if let Some(input) = self.input.as_mut() {
            input.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the attached input is actually streaming
    pub fn is_streaming(&self) -> bool {
        self.input
            .as_ref()
            .map(|input| input.is_streaming())
            .unwrap_or(false)
    }

    /// Take the preview frame receiver; only the first call returns it
    pub fn take_preview_receiver(&mut self) -> Option<FrameReceiver> {
        self.preview_receiver.take()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop_running();
        self.remove_output();
        self.remove_input();
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("backend_type", &self.backend.backend_type())
            .field("preset", &self.preset)
            .field("input", &self.input_device().map(|d| &d.name))
            .field("output", &self.output)
            .field("running", &self.running)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{SyntheticBackend, SyntheticEvent, SyntheticOptions};

    fn session() -> (SyntheticBackend, CaptureSession) {
        let backend = SyntheticBackend::new(SyntheticOptions::default());
        let session = CaptureSession::new(Arc::new(backend.clone()));
        (backend, session)
    }

    #[test]
    fn test_input_started_when_added_to_running_session() {
        let (backend, mut session) = session();
        let device = backend.enumerate_cameras().remove(0);

        session.start_running();
        let input = session.make_input(&device).unwrap();
        session.add_input(input);

        assert!(session.is_streaming());
        assert!(
            backend
                .events()
                .contains(&SyntheticEvent::StreamStarted(device.path.clone()))
        );
    }

    #[test]
    fn test_output_follows_input() {
        let (backend, mut session) = session();
        let device = backend.enumerate_cameras().remove(0);

        session.add_output(PhotoOutput::new());
        assert!(!session.output().unwrap().is_connected());

        let input = session.make_input(&device).unwrap();
        session.add_input(input);
        assert!(session.output().unwrap().is_connected());

        session.remove_input();
        assert!(!session.output().unwrap().is_connected());
        assert!(session.input_device().is_none());
    }

    #[test]
    fn test_stop_keeps_input_attached() {
        let (backend, mut session) = session();
        let device = backend.enumerate_cameras().remove(0);
        let input = session.make_input(&device).unwrap();
        session.add_input(input);

        session.start_running();
        session.stop_running();

        assert!(!session.is_running());
        assert!(!session.is_streaming());
        assert_eq!(session.input_device(), Some(&device));
    }

    #[test]
    fn test_preview_receiver_taken_once() {
        let (_, mut session) = session();
        assert!(session.take_preview_receiver().is_some());
        assert!(session.take_preview_receiver().is_none());
    }
}
