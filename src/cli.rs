// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a photo without the terminal UI

use snapcam::backends::camera::{CameraBackend, CameraPosition, Facing};
use snapcam::constants::timing;
use snapcam::pipelines::photo::encode_image;
use snapcam::{CaptureScreen, Config, Message, PreviewScreen, storage};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long to wait for the first preview frame
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// List all available cameras
pub fn list_cameras(backend: Arc<dyn CameraBackend>) -> Result<(), Box<dyn std::error::Error>> {
    let cameras = backend.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", backend.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let usage = match camera.position {
            CameraPosition::External => " (not used by the capture screen)",
            _ => "",
        };
        println!("  [{}] {}", index, camera.name);
        println!("      Position: {}{}", camera.position, usage);
        println!("      Path: {}", camera.path);
        if let Some(info) = &camera.device_info {
            println!("      Driver: {} ({})", info.driver, info.bus_info);
        }
        println!();
    }

    Ok(())
}

/// Take a photo through the capture screen and save it
pub fn take_photo(
    backend: Arc<dyn CameraBackend>,
    mut config: Config,
    front: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    config.initial_facing = if front { Facing::Front } else { Facing::Back };

    let mut screen = CaptureScreen::new(backend, config.clone());
    screen.load();

    let camera = screen
        .current_device()
        .ok_or_else(|| format!("No {} camera found", config.initial_facing.position()))?;
    println!("Using camera: {}", camera.name);

    // Let the camera warm up before grabbing a still
    println!("Capturing...");
    let start = Instant::now();
    loop {
        screen.update(Message::Tick);
        let frames = screen
            .preview_layer()
            .map(|layer| layer.frames_received())
            .unwrap_or(0);
        if frames > 0 && start.elapsed() > timing::WARMUP {
            break;
        }
        if start.elapsed() > FIRST_FRAME_TIMEOUT {
            return Err("Camera delivered no frames".into());
        }
        std::thread::sleep(timing::UI_TICK);
    }

    screen.capture_photo()?;
    let navigation = screen
        .wait_for_capture()
        .ok_or("Capture completed without an image")?;
    let mut preview = PreviewScreen::from_navigation(navigation);

    let path = match output {
        Some(path) => {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let data = encode_image(preview.image(), config.photo_codec, config.photo_quality)?;
            std::fs::write(&path, data)?;
            path
        }
        None => {
            let dir = config
                .photo_dir
                .clone()
                .unwrap_or_else(storage::photo_directory);
            preview.save(&dir, config.photo_codec, config.photo_quality)?
        }
    };

    println!("Photo saved: {}", path.display());
    Ok(())
}
