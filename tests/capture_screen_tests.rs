// SPDX-License-Identifier: GPL-3.0-only

//! Capture screen scenarios against the synthetic backend

use snapcam::app::PreviewScreen;
use snapcam::backends::camera::{
    CameraPosition, Facing, SyntheticBackend, SyntheticEvent, SyntheticOptions,
};
use snapcam::errors::ScreenError;
use snapcam::{CaptureScreen, Config, Message, PinchEvent};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn loaded_screen(options: SyntheticOptions) -> (SyntheticBackend, CaptureScreen) {
    let backend = SyntheticBackend::new(options);
    let mut screen = CaptureScreen::new(Arc::new(backend.clone()), Config::default());
    screen.load();
    (backend, screen)
}

fn pinch(screen: &mut CaptureScreen, scale: f64) {
    screen.update(Message::Pinch(PinchEvent::began()));
    screen.update(Message::Pinch(PinchEvent::changed(scale)));
    screen.update(Message::Pinch(PinchEvent::ended(scale)));
}

// ===== Load =====

#[test]
fn test_load_selects_back_camera_and_runs() {
    let (_backend, screen) = loaded_screen(SyntheticOptions::default());

    assert_eq!(screen.facing(), Facing::Back);
    assert_eq!(
        screen.current_device().map(|d| d.position),
        Some(CameraPosition::Back)
    );
    assert!(screen.front_camera().is_some());
    assert!(screen.session().is_running());
    assert!(screen.session().output().is_some());
    assert!(screen.preview_layer().is_some());
    assert!(screen.capture_button_style().is_some());
    assert_eq!(screen.zoom_factor(), 1.0);
    assert_eq!(screen.zoom_progress(), 0.0);
}

#[test]
fn test_external_cameras_ignored() {
    let options = SyntheticOptions {
        external: true,
        ..SyntheticOptions::default()
    };
    let (_backend, screen) = loaded_screen(options);

    assert_eq!(
        screen.back_camera().map(|d| d.position),
        Some(CameraPosition::Back)
    );
    assert_eq!(
        screen.front_camera().map(|d| d.position),
        Some(CameraPosition::Front)
    );
}

#[test]
fn test_missing_back_camera_leaves_no_device() {
    let options = SyntheticOptions {
        back: false,
        ..SyntheticOptions::default()
    };
    let (_backend, mut screen) = loaded_screen(options);

    assert!(screen.current_device().is_none());
    assert!(screen.session().input_device().is_none());
    assert_eq!(
        screen.capture_photo(),
        Err(ScreenError::NoDevice(CameraPosition::Back))
    );

    // Pinch without a device is ignored
    pinch(&mut screen, 2.0);
    assert_eq!(screen.zoom_factor(), 1.0);
}

#[test]
fn test_preview_layer_receives_frames() {
    let options = SyntheticOptions {
        frame_interval: Duration::from_millis(5),
        ..SyntheticOptions::default()
    };
    let (_backend, mut screen) = loaded_screen(options);

    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(2) {
        screen.update(Message::Tick);
        if screen.preview_layer().is_some_and(|l| l.frames_received() > 0) {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    let layer = screen.preview_layer().unwrap();
    assert!(layer.frames_received() > 0);
    assert!(layer.latest_frame().is_some());
}

// ===== Facing Toggle =====

#[test]
fn test_toggle_round_trip() {
    let (_backend, mut screen) = loaded_screen(SyntheticOptions::default());

    screen.toggle_facing().unwrap();
    assert_eq!(screen.facing(), Facing::Front);
    assert_eq!(
        screen.session().input_device().map(|d| d.position),
        Some(CameraPosition::Front)
    );

    screen.toggle_facing().unwrap();
    assert_eq!(screen.facing(), Facing::Back);
    assert_eq!(
        screen.current_device().map(|d| d.position),
        Some(CameraPosition::Back)
    );
    assert!(screen.session().is_running());
}

#[test]
fn test_toggle_reconfigures_session_in_order() {
    let (backend, mut screen) = loaded_screen(SyntheticOptions::default());
    let back = screen.back_camera().unwrap().path.clone();
    let front = screen.front_camera().unwrap().path.clone();
    let zoom_before = screen.zoom();
    backend.clear_events();

    screen.update(Message::FlipPressed);

    assert_eq!(
        backend.events(),
        vec![
            SyntheticEvent::StreamStopped(back),
            SyntheticEvent::InputOpened(front.clone()),
            SyntheticEvent::StreamStarted(front),
        ]
    );
    assert_eq!(screen.zoom(), zoom_before);
}

#[test]
fn test_toggle_without_other_camera_refused() {
    let options = SyntheticOptions {
        front: false,
        ..SyntheticOptions::default()
    };
    let (_backend, mut screen) = loaded_screen(options);

    assert_eq!(
        screen.toggle_facing(),
        Err(ScreenError::NoDevice(CameraPosition::Front))
    );
    assert_eq!(screen.facing(), Facing::Back);
    assert_eq!(
        screen.session().input_device().map(|d| d.position),
        Some(CameraPosition::Back)
    );
}

#[test]
fn test_failed_input_keeps_previous_input() {
    let options = SyntheticOptions {
        failing_inputs: vec![CameraPosition::Front],
        ..SyntheticOptions::default()
    };
    let (_backend, mut screen) = loaded_screen(options);

    screen.update(Message::FlipPressed);

    // The session still reads from the back camera
    assert_eq!(
        screen.session().input_device().map(|d| d.position),
        Some(CameraPosition::Back)
    );
    assert_eq!(
        screen.current_device().map(|d| d.position),
        Some(CameraPosition::Front)
    );
    assert!(screen.session().is_running());
}

// ===== Zoom =====

#[test]
fn test_pinch_scales_from_device_zoom() {
    let (backend, mut screen) = loaded_screen(SyntheticOptions::default());
    let back = screen.back_camera().unwrap().clone();
    backend.set_zoom_factor(&back, 2.0);

    pinch(&mut screen, 2.0);

    assert_eq!(screen.zoom_factor(), 4.0);
    assert!((screen.zoom_progress() - 0.75).abs() < 1e-6);
    assert_eq!(backend.zoom_factor(&back), 4.0);
}

#[test]
fn test_pinch_clamped_to_app_ceiling() {
    let (backend, mut screen) = loaded_screen(SyntheticOptions::default());
    let back = screen.back_camera().unwrap().clone();

    pinch(&mut screen, 20.0);
    assert_eq!(screen.zoom_factor(), 5.0);
    assert_eq!(screen.zoom_progress(), 1.0);

    pinch(&mut screen, 0.01);
    assert_eq!(screen.zoom_factor(), 1.0);
    assert_eq!(screen.zoom_progress(), 0.0);
    assert_eq!(backend.zoom_factor(&back), 1.0);
}

#[test]
fn test_pinch_clamped_to_device_maximum() {
    let options = SyntheticOptions {
        max_zoom_factor: 3.0,
        ..SyntheticOptions::default()
    };
    let (_backend, mut screen) = loaded_screen(options);

    pinch(&mut screen, 4.0);

    assert_eq!(screen.zoom_factor(), 3.0);
    assert!((screen.zoom_progress() - 0.5).abs() < 1e-6);
}

#[test]
fn test_pinch_skipped_when_lock_fails() {
    let options = SyntheticOptions {
        fail_configuration_lock: true,
        ..SyntheticOptions::default()
    };
    let (backend, mut screen) = loaded_screen(options);
    let back = screen.back_camera().unwrap().clone();

    pinch(&mut screen, 2.0);

    assert_eq!(screen.zoom_factor(), 1.0);
    assert_eq!(screen.zoom_progress(), 0.0);
    assert_eq!(backend.zoom_factor(&back), 1.0);
}

#[test]
fn test_configuration_lock_released_after_pinch() {
    let (backend, mut screen) = loaded_screen(SyntheticOptions::default());

    pinch(&mut screen, 1.5);
    pinch(&mut screen, 1.5);

    // Both gestures applied, so the lock was free for the second one
    let applied = backend
        .events()
        .into_iter()
        .filter(|e| matches!(e, SyntheticEvent::ZoomApplied(..)))
        .count();
    assert_eq!(applied, 2);
    assert!((screen.zoom_factor() - 2.25).abs() < 1e-9);
}

// ===== Capture =====

#[test]
fn test_capture_navigates_to_preview() {
    let (_backend, mut screen) = loaded_screen(SyntheticOptions::default());

    screen.capture_photo().unwrap();
    assert!(screen.is_capture_pending());

    let navigation = screen.wait_for_capture().expect("navigation");
    assert_eq!(navigation.identifier(), "Preview_Segue");
    assert!(!screen.is_capture_pending());

    let preview = PreviewScreen::from_navigation(navigation);
    assert_eq!(preview.image().width(), 320);
    assert_eq!(preview.image().height(), 240);
}

#[test]
fn test_capture_completion_delivered_on_tick() {
    let (_backend, mut screen) = loaded_screen(SyntheticOptions::default());
    screen.update(Message::CapturePressed);

    let mut navigations = 0;
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(2) {
        if screen.update(Message::Tick).is_some() {
            navigations += 1;
        }
        if navigations > 0 && !screen.is_capture_pending() {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(navigations, 1);
    assert!(screen.update(Message::Tick).is_none());
}

#[test]
fn test_empty_capture_does_not_navigate() {
    let options = SyntheticOptions {
        empty_captures: true,
        ..SyntheticOptions::default()
    };
    let (_backend, mut screen) = loaded_screen(options);

    screen.capture_photo().unwrap();
    assert!(screen.wait_for_capture().is_none());
    assert!(!screen.is_capture_pending());
}

#[test]
fn test_failed_capture_does_not_navigate() {
    let options = SyntheticOptions {
        failing_captures: true,
        ..SyntheticOptions::default()
    };
    let (_backend, mut screen) = loaded_screen(options);

    screen.capture_photo().unwrap();
    assert!(screen.wait_for_capture().is_none());

    // A new capture may be issued after a failure
    assert!(screen.capture_photo().is_ok());
}

#[test]
fn test_requests_refused_while_capture_pending() {
    let options = SyntheticOptions {
        capture_delay: Duration::from_millis(300),
        ..SyntheticOptions::default()
    };
    let (_backend, mut screen) = loaded_screen(options);

    screen.capture_photo().unwrap();
    assert_eq!(screen.capture_photo(), Err(ScreenError::CaptureInProgress));
    assert_eq!(screen.toggle_facing(), Err(ScreenError::CaptureInProgress));
    assert_eq!(screen.facing(), Facing::Back);

    assert!(screen.wait_for_capture().is_some());
    screen.toggle_facing().unwrap();
    assert_eq!(screen.facing(), Facing::Front);
}

#[test]
fn test_front_camera_capture() {
    let config = Config {
        initial_facing: Facing::Front,
        ..Config::default()
    };
    let mut screen = CaptureScreen::new(Arc::new(SyntheticBackend::default()), config);
    screen.load();

    assert_eq!(
        screen.current_device().map(|d| d.position),
        Some(CameraPosition::Front)
    );
    screen.capture_photo().unwrap();
    assert!(screen.wait_for_capture().is_some());
}

#[test]
fn test_preview_screen_saves_photo() {
    let (_backend, mut screen) = loaded_screen(SyntheticOptions::default());
    screen.capture_photo().unwrap();
    let mut preview = PreviewScreen::from_navigation(screen.wait_for_capture().unwrap());

    let dir = tempfile::tempdir().unwrap();
    let config = screen.config();
    let path = preview
        .save(dir.path(), config.photo_codec, config.photo_quality)
        .unwrap();

    assert_eq!(preview.saved_to(), Some(path.as_path()));
    let data = std::fs::read(&path).unwrap();
    assert_eq!(&data[..2], &[0xFF, 0xD8]);
}
