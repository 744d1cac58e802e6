// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic test-pattern cameras
//!
//! Provides a front and a back camera that render generated frames, so the
//! capture screen runs without hardware. Faults can be injected per backend
//! (failing inputs, a held configuration lock, captures without data) and
//! every session-visible action is recorded as a [`SyntheticEvent`].

use super::types::*;
use super::{CameraBackend, DeviceConfiguration, DeviceInput, StillSource};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Behaviour knobs for the synthetic backend
#[derive(Debug, Clone)]
pub struct SyntheticOptions {
    /// Provide a front-facing camera
    pub front: bool,
    /// Provide a back-facing camera
    pub back: bool,
    /// Provide an additional external camera (ignored by the capture screen)
    pub external: bool,
    /// Hardware zoom ceiling reported by every device
    pub max_zoom_factor: f64,
    /// Input construction fails for devices at these positions
    pub failing_inputs: Vec<CameraPosition>,
    /// Configuration lock acquisition always fails
    pub fail_configuration_lock: bool,
    /// Still captures complete without image data
    pub empty_captures: bool,
    /// Still captures fail with an error
    pub failing_captures: bool,
    /// Delay before a still capture returns
    pub capture_delay: Duration,
    pub frame_size: (u32, u32),
    pub frame_interval: Duration,
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            front: true,
            back: true,
            external: false,
            max_zoom_factor: 10.0,
            failing_inputs: Vec::new(),
            fail_configuration_lock: false,
            empty_captures: false,
            failing_captures: false,
            capture_delay: Duration::ZERO,
            frame_size: (320, 240),
            frame_interval: Duration::from_millis(66),
        }
    }
}

/// Something the synthetic backend was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum SyntheticEvent {
    InputOpened(String),
    StreamStarted(String),
    StreamStopped(String),
    ZoomApplied(String, f64),
}

/// State shared between the backend, its inputs and configuration guards
#[derive(Debug, Default)]
struct SharedState {
    options: Mutex<SyntheticOptions>,
    zoom: Mutex<HashMap<String, f64>>,
    locked: Mutex<HashSet<String>>,
    events: Mutex<Vec<SyntheticEvent>>,
}

impl SharedState {
    fn options(&self) -> SyntheticOptions {
        lock(&self.options).clone()
    }

    fn record(&self, event: SyntheticEvent) {
        debug!(?event, "Synthetic camera event");
        lock(&self.events).push(event);
    }

    fn zoom_factor(&self, path: &str) -> f64 {
        lock(&self.zoom).get(path).copied().unwrap_or(1.0)
    }
}

/// Lock a mutex, recovering the data if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Backend serving generated test-pattern cameras
#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    state: Arc<SharedState>,
}

impl SyntheticBackend {
    pub fn new(options: SyntheticOptions) -> Self {
        info!(
            front = options.front,
            back = options.back,
            max_zoom = options.max_zoom_factor,
            "Creating synthetic camera backend"
        );
        let state = SharedState {
            options: Mutex::new(options),
            ..SharedState::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// Change options after creation (e.g. to inject a fault mid-session)
    pub fn update_options(&self, update: impl FnOnce(&mut SyntheticOptions)) {
        update(&mut lock(&self.state.options));
    }

    /// Events recorded so far, oldest first
    pub fn events(&self) -> Vec<SyntheticEvent> {
        lock(&self.state.events).clone()
    }

    pub fn clear_events(&self) {
        lock(&self.state.events).clear();
    }

    /// Current zoom factor of a device
    pub fn zoom_factor(&self, device: &CameraDevice) -> f64 {
        self.state.zoom_factor(&device.path)
    }

    /// Set a device's zoom factor without going through the configuration lock
    pub fn set_zoom_factor(&self, device: &CameraDevice, factor: f64) {
        lock(&self.state.zoom).insert(device.path.clone(), factor);
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new(SyntheticOptions::default())
    }
}

fn synthetic_device(position: CameraPosition) -> CameraDevice {
    let name = match position {
        CameraPosition::Back => "Synthetic Back Camera",
        CameraPosition::Front => "Synthetic Front Camera",
        CameraPosition::External => "Synthetic External Camera",
    };
    CameraDevice {
        name: name.to_string(),
        path: format!("synthetic:{}", position),
        position,
        device_info: None,
    }
}

impl CameraBackend for SyntheticBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Synthetic
    }

    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let options = self.state.options();
        let mut cameras = Vec::new();
        if options.back {
            cameras.push(synthetic_device(CameraPosition::Back));
        }
        if options.front {
            cameras.push(synthetic_device(CameraPosition::Front));
        }
        if options.external {
            cameras.push(synthetic_device(CameraPosition::External));
        }
        cameras
    }

    fn open_input(
        &self,
        device: &CameraDevice,
        _preset: SessionPreset,
    ) -> BackendResult<Box<dyn DeviceInput>> {
        let options = self.state.options();
        if options.failing_inputs.contains(&device.position) {
            return Err(BackendError::DeviceBusy(format!(
                "{} is in use by another application",
                device.name
            )));
        }

        self.state
            .record(SyntheticEvent::InputOpened(device.path.clone()));
        Ok(Box::new(SyntheticInput {
            device: device.clone(),
            state: Arc::clone(&self.state),
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }))
    }

    fn lock_for_configuration(
        &self,
        device: &CameraDevice,
    ) -> BackendResult<Box<dyn DeviceConfiguration>> {
        if self.state.options().fail_configuration_lock {
            return Err(BackendError::ConfigurationLocked(format!(
                "{} is locked by another client",
                device.name
            )));
        }

        let mut locked = lock(&self.state.locked);
        if !locked.insert(device.path.clone()) {
            return Err(BackendError::ConfigurationLocked(format!(
                "{} is already locked",
                device.name
            )));
        }

        Ok(Box::new(SyntheticConfiguration {
            path: device.path.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

/// Configuration guard for a synthetic device
struct SyntheticConfiguration {
    path: String,
    state: Arc<SharedState>,
}

impl DeviceConfiguration for SyntheticConfiguration {
    fn video_zoom_factor(&self) -> f64 {
        self.state.zoom_factor(&self.path)
    }

    fn max_video_zoom_factor(&self) -> f64 {
        self.state.options().max_zoom_factor.max(1.0)
    }

    fn set_video_zoom_factor(&mut self, factor: f64) -> BackendResult<()> {
        let max = self.max_video_zoom_factor();
        if !(1.0..=max).contains(&factor) {
            return Err(BackendError::Control(format!(
                "zoom factor {factor} outside 1..={max}"
            )));
        }
        lock(&self.state.zoom).insert(self.path.clone(), factor);
        self.state
            .record(SyntheticEvent::ZoomApplied(self.path.clone(), factor));
        Ok(())
    }
}

impl Drop for SyntheticConfiguration {
    fn drop(&mut self) {
        lock(&self.state.locked).remove(&self.path);
    }
}

/// Session input streaming generated frames
struct SyntheticInput {
    device: CameraDevice,
    state: Arc<SharedState>,
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl DeviceInput for SyntheticInput {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn start(&mut self, mut preview: FrameSender) -> BackendResult<()> {
        if self.is_streaming() {
            return Ok(());
        }

        self.running.store(true, Ordering::SeqCst);
        self.state
            .record(SyntheticEvent::StreamStarted(self.device.path.clone()));

        let running = Arc::clone(&self.running);
        let state = Arc::clone(&self.state);
        let device = self.device.clone();
        let handle = std::thread::Builder::new()
            .name(format!("synthetic-{}", device.position))
            .spawn(move || {
                static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

                while running.load(Ordering::SeqCst) {
                    let options = state.options();
                    let tick = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
                    let frame = render_test_pattern(
                        options.frame_size,
                        device.position,
                        state.zoom_factor(&device.path),
                        tick,
                    );
                    // Drop the frame if the preview is behind
                    if let Err(e) = preview.try_send(frame) {
                        if e.is_disconnected() {
                            debug!("Preview receiver dropped, stopping synthetic stream");
                            break;
                        }
                    }
                    std::thread::sleep(options.frame_interval);
                }
            })
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        self.thread_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.state
            .record(SyntheticEvent::StreamStopped(self.device.path.clone()));

        // Return without waiting for the generator thread to wind down
        self.thread_handle.take();
    }

    fn is_streaming(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn still_source(&self) -> Arc<dyn StillSource> {
        Arc::new(SyntheticStillSource {
            device: self.device.clone(),
            state: Arc::clone(&self.state),
        })
    }
}

impl Drop for SyntheticInput {
    fn drop(&mut self) {
        self.stop();
    }
}

struct SyntheticStillSource {
    device: CameraDevice,
    state: Arc<SharedState>,
}

impl StillSource for SyntheticStillSource {
    fn capture_still(&self) -> BackendResult<Option<CameraFrame>> {
        let options = self.state.options();
        if !options.capture_delay.is_zero() {
            std::thread::sleep(options.capture_delay);
        }
        if options.failing_captures {
            warn!(device = %self.device.name, "Injected capture failure");
            return Err(BackendError::IoError("synthetic capture failure".to_string()));
        }
        if options.empty_captures {
            return Ok(None);
        }
        Ok(Some(render_test_pattern(
            options.frame_size,
            self.device.position,
            self.state.zoom_factor(&self.device.path),
            0,
        )))
    }
}

/// Render an RGBA test pattern
///
/// Back cameras show vertical colour bars, front cameras a diagonal
/// gradient. The pattern is magnified around its centre by `zoom` and a
/// marker column sweeps across with `tick`.
pub fn render_test_pattern(
    (width, height): (u32, u32),
    position: CameraPosition,
    zoom: f64,
    tick: u64,
) -> CameraFrame {
    const BARS: [[u8; 3]; 7] = [
        [192, 192, 192],
        [192, 192, 0],
        [0, 192, 192],
        [0, 192, 0],
        [192, 0, 192],
        [192, 0, 0],
        [0, 0, 192],
    ];

    let zoom = zoom.max(1.0);
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let marker = if width > 0 { (tick % width as u64) as u32 } else { 0 };

    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            // Source coordinates after magnification
            let sx = cx + (x as f64 - cx) / zoom;
            let sy = cy + (y as f64 - cy) / zoom;

            let rgb = if x == marker {
                [255, 255, 255]
            } else {
                match position {
                    CameraPosition::Front => {
                        let t = (sx + sy) / (width + height).max(1) as f64;
                        let v = (t * 255.0).clamp(0.0, 255.0) as u8;
                        [v, 96, 255 - v]
                    }
                    _ => {
                        let bar = ((sx / width.max(1) as f64) * BARS.len() as f64) as usize;
                        BARS[bar.min(BARS.len() - 1)]
                    }
                }
            };
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
    }

    CameraFrame::from_rgba(width, height, data)
}
