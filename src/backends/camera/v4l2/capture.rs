// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 streaming capture thread
//!
//! Opens the device, negotiates MJPG (or YUYV) at the session preset size
//! and streams memory-mapped buffers. Every frame goes to the preview channel
//! and replaces the latest still kept for the photo output.

use crate::backends::camera::types::*;
use crate::constants::timing::FRAME_LOG_INTERVAL;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Latest decoded frame, shared with the still source
pub type LatestFrame = Arc<Mutex<Option<CameraFrame>>>;

/// Streaming pipeline running on its own thread
pub struct V4l2Pipeline {
    device_path: String,
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl V4l2Pipeline {
    /// Start streaming `device_path` into `preview`
    pub fn start(
        device_path: &str,
        preset: SessionPreset,
        preview: FrameSender,
        latest: LatestFrame,
    ) -> BackendResult<Self> {
        info!(device_path, ?preset, "Starting V4L2 capture pipeline");

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let path = device_path.to_string();

        let thread_handle = std::thread::Builder::new()
            .name("v4l2-capture".to_string())
            .spawn(move || {
                if let Err(e) = capture_loop(&path, preset, preview, latest, running_clone) {
                    error!(error = %e, device_path = %path, "V4L2 capture loop failed");
                }
            })
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        Ok(Self {
            device_path: device_path.to_string(),
            running,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the capture thread to stop
    ///
    /// Returns immediately; the thread exits after its current buffer.
    pub fn stop(&mut self) {
        info!(device_path = %self.device_path, "Stopping V4L2 capture pipeline");
        self.running.store(false, Ordering::SeqCst);
        self.thread_handle.take();
    }
}

impl Drop for V4l2Pipeline {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Main capture loop running in a separate thread
fn capture_loop(
    device_path: &str,
    preset: SessionPreset,
    mut preview: FrameSender,
    latest: LatestFrame,
    running: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut dev = Device::with_path(device_path)
        .map_err(|e| format!("Failed to open V4L2 device {}: {}", device_path, e))?;

    let (width, height) = preset.requested_size();
    let mut format = dev
        .format()
        .map_err(|e| format!("Failed to query format: {}", e))?;
    format.width = width;
    format.height = height;
    format.fourcc = v4l::FourCC::new(b"MJPG");

    let format = match dev.set_format(&format) {
        Ok(f) => f,
        Err(e) => {
            warn!(error = %e, "MJPG not accepted, falling back to YUYV");
            format.fourcc = v4l::FourCC::new(b"YUYV");
            dev.set_format(&format)
                .map_err(|e| format!("Failed to set format: {}", e))?
        }
    };
    info!(
        width = format.width,
        height = format.height,
        fourcc = ?format.fourcc,
        "Negotiated V4L2 format"
    );

    let mut stream = MmapStream::with_buffers(&mut dev, Type::VideoCapture, 4)
        .map_err(|e| format!("Failed to create buffer stream: {}", e))?;

    while running.load(Ordering::SeqCst) {
        let (buf, meta) = match stream.next() {
            Ok(next) => next,
            Err(e) => {
                error!(error = %e, "Failed to dequeue V4L2 buffer");
                break;
            }
        };
        let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);

        let Some(frame) = decode_buffer(buf, &format) else {
            if frame_num % FRAME_LOG_INTERVAL == 0 {
                warn!(frame = frame_num, fourcc = ?format.fourcc, "Could not decode V4L2 buffer");
            }
            continue;
        };

        if let Ok(mut slot) = latest.lock() {
            *slot = Some(frame.clone());
        }

        if let Err(e) = preview.try_send(frame) {
            if e.is_disconnected() {
                debug!("Preview receiver dropped, ending capture loop");
                break;
            }
        }

        if frame_num % (FRAME_LOG_INTERVAL * 2) == 0 {
            debug!(frame = frame_num, sequence = meta.sequence, "V4L2 frame delivered");
        }
    }

    info!(device_path, "V4L2 capture loop finished");
    Ok(())
}

/// Turn a dequeued buffer into a frame
fn decode_buffer(buf: &[u8], format: &v4l::Format) -> Option<CameraFrame> {
    if format.fourcc == v4l::FourCC::new(b"MJPG") {
        let decoded = image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg).ok()?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        return Some(CameraFrame::from_rgba(width, height, rgba.into_raw()));
    }

    if format.fourcc == v4l::FourCC::new(b"YUYV") {
        let stride = format.stride.max(PixelFormat::YUYV.min_stride(format.width));
        if buf.len() < (stride * format.height) as usize {
            return None;
        }
        return Some(CameraFrame {
            width: format.width,
            height: format.height,
            data: Arc::from(buf),
            format: PixelFormat::YUYV,
            stride,
            captured_at: Instant::now(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn format(width: u32, height: u32, fourcc: &[u8; 4], stride: u32) -> v4l::Format {
        let mut format = v4l::Format::new(width, height, v4l::FourCC::new(fourcc));
        format.stride = stride;
        format
    }

    #[test]
    fn test_yuyv_short_buffer_rejected() {
        let format = format(4, 2, b"YUYV", 0);
        assert!(decode_buffer(&[0u8; 15], &format).is_none());
    }

    #[test]
    fn test_yuyv_zero_stride_uses_packed_width() {
        let format = format(4, 2, b"YUYV", 0);
        let frame = decode_buffer(&[128u8; 16], &format).expect("frame");
        assert_eq!(frame.stride, 8);
        assert_eq!(frame.format, PixelFormat::YUYV);
        assert_eq!((frame.width, frame.height), (4, 2));
    }

    #[test]
    fn test_yuyv_padded_stride_kept() {
        let format = format(4, 2, b"YUYV", 12);
        assert!(decode_buffer(&[128u8; 16], &format).is_none());
        let frame = decode_buffer(&[128u8; 24], &format).expect("frame");
        assert_eq!(frame.stride, 12);
    }

    #[test]
    fn test_mjpg_decoded_to_rgba() {
        let mut jpeg = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 4, image::Rgb([200, 10, 10])))
            .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let frame = decode_buffer(&jpeg, &format(8, 4, b"MJPG", 0)).expect("frame");
        assert_eq!(frame.format, PixelFormat::RGBA);
        assert_eq!((frame.width, frame.height), (8, 4));
        assert_eq!(frame.stride, 32);
        let (r, _, _) = frame.pixel_rgb(3, 2);
        assert!(r > 150);
    }

    #[test]
    fn test_corrupt_mjpg_dropped() {
        assert!(decode_buffer(&[0xFF, 0xD8, 0x00], &format(8, 4, b"MJPG", 0)).is_none());
    }

    #[test]
    fn test_unsupported_fourcc_dropped() {
        assert!(decode_buffer(&[0u8; 64], &format(4, 2, b"NV12", 0)).is_none());
    }
}
