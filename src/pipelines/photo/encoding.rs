// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! Encodes captured frames and decoded images into file data:
//! - JPEG (with quality control)
//! - PNG (lossless)

use crate::backends::camera::types::CameraFrame;
use crate::errors::{PhotoError, PhotoResult};
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoCodec {
    /// Baseline JPEG (lossy compression)
    #[default]
    Jpeg,
    /// PNG (lossless compression)
    Png,
}

impl PhotoCodec {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            PhotoCodec::Jpeg => "jpg",
            PhotoCodec::Png => "png",
        }
    }
}

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Encode a captured camera frame
pub fn encode_frame(
    frame: &CameraFrame,
    codec: PhotoCodec,
    quality: EncodingQuality,
) -> PhotoResult<Vec<u8>> {
    encode_rgb(&frame.to_rgb_image(), codec, quality)
}

/// Encode a decoded image, e.g. for saving from the preview screen
pub fn encode_image(
    image: &DynamicImage,
    codec: PhotoCodec,
    quality: EncodingQuality,
) -> PhotoResult<Vec<u8>> {
    encode_rgb(&image.to_rgb8(), codec, quality)
}

fn encode_rgb(image: &RgbImage, codec: PhotoCodec, quality: EncodingQuality) -> PhotoResult<Vec<u8>> {
    let data = match codec {
        PhotoCodec::Jpeg => encode_jpeg(image, quality)?,
        PhotoCodec::Png => encode_png(image)?,
    };
    debug!(
        size = data.len(),
        width = image.width(),
        height = image.height(),
        ?codec,
        "Encoding complete"
    );
    Ok(data)
}

/// Encode image as JPEG
fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> PhotoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.jpeg_quality());

    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

    Ok(buffer)
}

/// Encode image as PNG
fn encode_png(image: &RgbImage) -> PhotoResult<Vec<u8>> {
    let mut buffer = Vec::new();

    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| PhotoError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;

    Ok(buffer)
}
