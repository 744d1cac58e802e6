// SPDX-License-Identifier: MPL-2.0

//! Photo output sink
//!
//! A [`PhotoOutput`] is attached to a capture session and connected to the
//! session's input. Each capture request grabs one still from the input on a
//! worker thread, encodes it, and reports back on a oneshot channel held by
//! the returned [`PendingCapture`]. The preview stream is not interrupted.

use super::encoding::{self, EncodingQuality, PhotoCodec};
use crate::backends::camera::StillSource;
use crate::errors::{PhotoError, PhotoResult};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, error, info, warn};

/// Settings for one capture request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhotoSettings {
    pub codec: PhotoCodec,
    pub quality: EncodingQuality,
}

impl PhotoSettings {
    pub fn with_codec(codec: PhotoCodec) -> Self {
        Self {
            codec,
            ..Self::default()
        }
    }
}

/// Result of a completed capture request
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    data: Option<Vec<u8>>,
    pub settings: PhotoSettings,
    pub width: u32,
    pub height: u32,
}

impl CapturedPhoto {
    /// A capture the device answered without image data
    pub fn empty(settings: PhotoSettings) -> Self {
        Self {
            data: None,
            settings,
            width: 0,
            height: 0,
        }
    }

    /// A capture carrying already-encoded file data
    pub fn with_data(data: Vec<u8>, settings: PhotoSettings, width: u32, height: u32) -> Self {
        Self {
            data: Some(data),
            settings,
            width,
            height,
        }
    }

    /// Encoded file data, `None` if the device returned nothing
    pub fn file_data_representation(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }
}

/// An outstanding capture request
///
/// The result is delivered from the capture worker; poll it from the UI
/// thread with [`try_complete`](Self::try_complete) or block on
/// [`wait`](Self::wait).
#[derive(Debug)]
pub struct PendingCapture {
    receiver: oneshot::Receiver<PhotoResult<CapturedPhoto>>,
    requested_at: Instant,
}

impl PendingCapture {
    /// Build a pending capture from a result channel
    pub fn new(receiver: oneshot::Receiver<PhotoResult<CapturedPhoto>>) -> Self {
        Self {
            receiver,
            requested_at: Instant::now(),
        }
    }

    /// Non-blocking check for the result
    pub fn try_complete(&mut self) -> Option<PhotoResult<CapturedPhoto>> {
        match self.receiver.try_recv() {
            Ok(result) => {
                debug!(elapsed = ?self.requested_at.elapsed(), "Capture completed");
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(PhotoError::WorkerGone)),
        }
    }

    /// Block the current thread until the result arrives
    ///
    /// Must not be called from within an async runtime.
    pub fn wait(self) -> PhotoResult<CapturedPhoto> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(PhotoError::WorkerGone))
    }
}

/// Still-image output attached to a capture session
#[derive(Default)]
pub struct PhotoOutput {
    prepared: Vec<PhotoSettings>,
    source: Option<Arc<dyn StillSource>>,
}

impl PhotoOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the settings upcoming requests will use
    pub fn set_prepared_photo_settings(&mut self, settings: Vec<PhotoSettings>) {
        debug!(?settings, "Prepared photo settings");
        self.prepared = settings;
    }

    pub fn prepared_photo_settings(&self) -> &[PhotoSettings] {
        &self.prepared
    }

    /// Connect to the session input's still source
    pub fn connect(&mut self, source: Arc<dyn StillSource>) {
        self.source = Some(source);
    }

    pub fn disconnect(&mut self) {
        self.source = None;
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// Request one photo
    ///
    /// Requests with settings that were not prepared still run; the
    /// mismatch is only logged.
    pub fn capture_photo(&self, settings: PhotoSettings) -> PhotoResult<PendingCapture> {
        let source = self.source.clone().ok_or(PhotoError::NotConnected)?;

        if !self.prepared.is_empty() && !self.prepared.iter().any(|p| p.codec == settings.codec) {
            warn!(codec = ?settings.codec, "Capturing with unprepared photo settings");
        }

        info!(codec = ?settings.codec, "Capturing photo");
        let (sender, receiver) = oneshot::channel();

        std::thread::Builder::new()
            .name("photo-capture".to_string())
            .spawn(move || {
                let result = run_capture(source.as_ref(), settings);
                if let Err(e) = &result {
                    error!(error = %e, "Photo capture failed");
                }
                // Receiver may have been dropped with its screen
                let _ = sender.send(result);
            })
            .map_err(|e| PhotoError::CaptureFailed(format!("Failed to spawn capture worker: {}", e)))?;

        Ok(PendingCapture::new(receiver))
    }
}

impl std::fmt::Debug for PhotoOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoOutput")
            .field("prepared", &self.prepared)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Grab and encode one still
fn run_capture(source: &dyn StillSource, settings: PhotoSettings) -> PhotoResult<CapturedPhoto> {
    let Some(frame) = source.capture_still()? else {
        debug!("Still source returned no frame");
        return Ok(CapturedPhoto::empty(settings));
    };

    debug!(
        width = frame.width,
        height = frame.height,
        format = ?frame.format,
        "Frame captured from input"
    );

    let data = encoding::encode_frame(&frame, settings.codec, settings.quality)?;
    Ok(CapturedPhoto::with_data(
        data,
        settings,
        frame.width,
        frame.height,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{BackendResult, CameraFrame};

    struct FixedSource(Option<CameraFrame>);

    impl StillSource for FixedSource {
        fn capture_still(&self) -> BackendResult<Option<CameraFrame>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_unconnected_output_rejects_capture() {
        let output = PhotoOutput::new();
        assert_eq!(
            output.capture_photo(PhotoSettings::default()).unwrap_err(),
            PhotoError::NotConnected
        );
    }

    #[test]
    fn test_capture_produces_jpeg() {
        let mut output = PhotoOutput::new();
        output.connect(Arc::new(FixedSource(Some(CameraFrame::from_rgba(
            4,
            4,
            vec![128u8; 64],
        )))));

        let photo = output
            .capture_photo(PhotoSettings::default())
            .unwrap()
            .wait()
            .unwrap();
        let data = photo.file_data_representation().unwrap();
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
        assert_eq!((photo.width, photo.height), (4, 4));
    }

    #[test]
    fn test_capture_without_frame_has_no_data() {
        let mut output = PhotoOutput::new();
        output.connect(Arc::new(FixedSource(None)));

        let photo = output
            .capture_photo(PhotoSettings::default())
            .unwrap()
            .wait()
            .unwrap();
        assert!(photo.file_data_representation().is_none());
    }

    #[test]
    fn test_dropped_sender_reports_worker_gone() {
        let (sender, receiver) = oneshot::channel();
        drop(sender);
        let mut pending = PendingCapture::new(receiver);
        assert_eq!(pending.try_complete().unwrap().unwrap_err(), PhotoError::WorkerGone);
    }
}
