// SPDX-License-Identifier: GPL-3.0-only

//! Live preview layer
//!
//! The preview layer is bound to the capture session's frame channel and
//! keeps the most recent frame. Renderers ask it for the colour at a display
//! pixel; the layer maps that pixel into the frame according to its gravity
//! and orientation.

use crate::backends::camera::{CameraFrame, FrameReceiver};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the frame is scaled into the layer bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoGravity {
    /// Preserve aspect ratio and fill the bounds, cropping the overflow
    #[default]
    ResizeAspectFill,
    /// Preserve aspect ratio and fit inside the bounds, leaving bars
    ResizeAspect,
    /// Stretch to the bounds
    Resize,
}

/// Rotation applied to frames before display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoOrientation {
    /// Frames shown as delivered
    #[default]
    Portrait,
    /// Rotated 90° clockwise
    LandscapeRight,
    /// Rotated 180°
    PortraitUpsideDown,
    /// Rotated 90° counter-clockwise
    LandscapeLeft,
}

impl VideoOrientation {
    fn swaps_axes(self) -> bool {
        matches!(
            self,
            VideoOrientation::LandscapeRight | VideoOrientation::LandscapeLeft
        )
    }
}

/// Layer bounds in display pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerFrame {
    pub width: u32,
    pub height: u32,
}

/// Anything the preview can sample colours from
pub trait PixelSource {
    fn dimensions(&self) -> (u32, u32);
    fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8);
}

impl PixelSource for CameraFrame {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        self.pixel_rgb(x, y)
    }
}

impl PixelSource for image::RgbImage {
    fn dimensions(&self) -> (u32, u32) {
        image::RgbImage::dimensions(self)
    }

    fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let x = x.min(self.width().saturating_sub(1));
        let y = y.min(self.height().saturating_sub(1));
        let [r, g, b] = self.get_pixel(x, y).0;
        (r, g, b)
    }
}

/// Map a display pixel to a source pixel
///
/// Returns `None` for display pixels outside the image (the bars of
/// [`VideoGravity::ResizeAspect`]) and for empty sources or bounds.
pub fn source_coordinate(
    gravity: VideoGravity,
    orientation: VideoOrientation,
    (src_w, src_h): (u32, u32),
    bounds: LayerFrame,
    (x, y): (u32, u32),
) -> Option<(u32, u32)> {
    if src_w == 0 || src_h == 0 || bounds.width == 0 || bounds.height == 0 {
        return None;
    }
    if x >= bounds.width || y >= bounds.height {
        return None;
    }

    // Size of the source once rotated for display
    let (rot_w, rot_h) = if orientation.swaps_axes() {
        (src_h, src_w)
    } else {
        (src_w, src_h)
    };

    let (dw, dh) = (bounds.width as f64, bounds.height as f64);
    let (rw, rh) = (rot_w as f64, rot_h as f64);
    let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);

    let (rx, ry) = match gravity {
        VideoGravity::Resize => (px * rw / dw, py * rh / dh),
        VideoGravity::ResizeAspectFill => {
            let scale = (dw / rw).max(dh / rh);
            let off_x = (rw - dw / scale) / 2.0;
            let off_y = (rh - dh / scale) / 2.0;
            (off_x + px / scale, off_y + py / scale)
        }
        VideoGravity::ResizeAspect => {
            let scale = (dw / rw).min(dh / rh);
            let off_x = (dw - rw * scale) / 2.0;
            let off_y = (dh - rh * scale) / 2.0;
            let (sx, sy) = ((px - off_x) / scale, (py - off_y) / scale);
            if sx < 0.0 || sy < 0.0 || sx >= rw || sy >= rh {
                return None;
            }
            (sx, sy)
        }
    };

    let rx = (rx.max(0.0) as u32).min(rot_w - 1);
    let ry = (ry.max(0.0) as u32).min(rot_h - 1);

    Some(match orientation {
        VideoOrientation::Portrait => (rx, ry),
        VideoOrientation::LandscapeRight => (ry, src_h - 1 - rx),
        VideoOrientation::PortraitUpsideDown => (src_w - 1 - rx, src_h - 1 - ry),
        VideoOrientation::LandscapeLeft => (src_w - 1 - ry, rx),
    })
}

/// Sample `source` at a display pixel
pub fn sample<S: PixelSource + ?Sized>(
    source: &S,
    gravity: VideoGravity,
    orientation: VideoOrientation,
    bounds: LayerFrame,
    pixel: (u32, u32),
) -> Option<(u8, u8, u8)> {
    source_coordinate(gravity, orientation, source.dimensions(), bounds, pixel)
        .map(|(sx, sy)| source.rgb_at(sx, sy))
}

/// Rendering surface showing the session's live feed
pub struct PreviewLayer {
    receiver: FrameReceiver,
    gravity: VideoGravity,
    orientation: VideoOrientation,
    frame: LayerFrame,
    /// Stacking position; chrome is drawn above index 0
    z_index: i32,
    latest: Option<CameraFrame>,
    frames_received: u64,
}

impl PreviewLayer {
    pub fn new(
        receiver: FrameReceiver,
        gravity: VideoGravity,
        orientation: VideoOrientation,
    ) -> Self {
        Self {
            receiver,
            gravity,
            orientation,
            frame: LayerFrame::default(),
            z_index: 0,
            latest: None,
            frames_received: 0,
        }
    }

    /// Resize the layer, e.g. to the full screen
    pub fn set_frame(&mut self, frame: LayerFrame) {
        if frame != self.frame {
            debug!(width = frame.width, height = frame.height, "Preview layer resized");
            self.frame = frame;
        }
    }

    pub fn frame(&self) -> LayerFrame {
        self.frame
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Pull every queued frame, keeping the newest
    ///
    /// Returns how many frames were taken.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(frame) = self.receiver.try_recv() {
            self.latest = Some(frame);
            count += 1;
        }
        self.frames_received += count as u64;
        count
    }

    pub fn latest_frame(&self) -> Option<&CameraFrame> {
        self.latest.as_ref()
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Forget the last frame so a switched camera does not show the old feed
    pub fn clear(&mut self) {
        self.latest = None;
    }

    /// Colour at a display pixel of the layer
    pub fn sample(&self, pixel: (u32, u32)) -> Option<(u8, u8, u8)> {
        let frame = self.latest.as_ref()?;
        sample(frame, self.gravity, self.orientation, self.frame, pixel)
    }
}

impl std::fmt::Debug for PreviewLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewLayer")
            .field("gravity", &self.gravity)
            .field("orientation", &self.orientation)
            .field("frame", &self.frame)
            .field("z_index", &self.z_index)
            .field("frames_received", &self.frames_received)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(width: u32, height: u32) -> LayerFrame {
        LayerFrame { width, height }
    }

    #[test]
    fn test_aspect_fill_crops_sides() {
        // 200x100 source into a 100x100 layer: the centre 100 columns show
        let coord = |x, y| {
            source_coordinate(
                VideoGravity::ResizeAspectFill,
                VideoOrientation::Portrait,
                (200, 100),
                bounds(100, 100),
                (x, y),
            )
        };
        assert_eq!(coord(0, 0), Some((50, 0)));
        assert_eq!(coord(99, 99), Some((149, 99)));
    }

    #[test]
    fn test_aspect_fit_letterboxes() {
        // 200x100 source into a 100x100 layer: rows 0..25 and 75..100 are bars
        let coord = |x, y| {
            source_coordinate(
                VideoGravity::ResizeAspect,
                VideoOrientation::Portrait,
                (200, 100),
                bounds(100, 100),
                (x, y),
            )
        };
        assert_eq!(coord(50, 10), None);
        assert_eq!(coord(50, 90), None);
        assert_eq!(coord(0, 25), Some((1, 1)));
    }

    #[test]
    fn test_rotation_corners() {
        let corner = |orientation| {
            source_coordinate(
                VideoGravity::Resize,
                orientation,
                (4, 2),
                bounds(2, 4),
                (0, 0),
            )
        };
        // The display's top-left shows the source's bottom-left after a clockwise turn
        assert_eq!(corner(VideoOrientation::LandscapeRight), Some((0, 1)));
        assert_eq!(corner(VideoOrientation::LandscapeLeft), Some((3, 0)));
    }

    #[test]
    fn test_empty_bounds_sample_nothing() {
        assert_eq!(
            source_coordinate(
                VideoGravity::ResizeAspectFill,
                VideoOrientation::Portrait,
                (10, 10),
                bounds(0, 0),
                (0, 0),
            ),
            None
        );
    }

    #[test]
    fn test_drain_keeps_newest() {
        let (mut sender, receiver) = futures::channel::mpsc::channel(4);
        let mut layer = PreviewLayer::new(
            receiver,
            VideoGravity::ResizeAspectFill,
            VideoOrientation::Portrait,
        );
        sender
            .try_send(CameraFrame::from_rgba(1, 1, vec![0, 0, 0, 255]))
            .unwrap();
        sender
            .try_send(CameraFrame::from_rgba(2, 1, vec![255; 8]))
            .unwrap();

        assert_eq!(layer.drain(), 2);
        assert_eq!(layer.latest_frame().unwrap().width, 2);
        assert_eq!(layer.z_index(), 0);
    }
}
