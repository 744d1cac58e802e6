// SPDX-License-Identifier: GPL-3.0-only

//! Preview screen
//!
//! Shows the image handed over by the capture screen. The image is the only
//! thing that crosses the transition.

use crate::app::state::Navigation;
use crate::errors::PhotoResult;
use crate::pipelines::photo::{EncodingQuality, PhotoCodec, encode_image};
use crate::storage;
use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};
use tracing::info;

/// Screen presenting a captured photo
pub struct PreviewScreen {
    image: DynamicImage,
    /// RGB copy for rendering
    rgb: RgbImage,
    saved_to: Option<PathBuf>,
}

impl PreviewScreen {
    pub fn new(image: DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        Self {
            image,
            rgb,
            saved_to: None,
        }
    }

    /// Receive the capture screen's transition
    pub fn from_navigation(navigation: Navigation) -> Self {
        info!(identifier = navigation.identifier(), "Presenting preview screen");
        match navigation {
            Navigation::Preview { image } => Self::new(image),
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn saved_to(&self) -> Option<&Path> {
        self.saved_to.as_deref()
    }

    /// Save the image as a timestamped file in `dir`
    pub fn save(
        &mut self,
        dir: &Path,
        codec: PhotoCodec,
        quality: EncodingQuality,
    ) -> PhotoResult<PathBuf> {
        let data = encode_image(&self.image, codec, quality)?;
        let path = storage::save_photo(&data, codec.extension(), dir)?;
        self.saved_to = Some(path.clone());
        Ok(path)
    }
}

impl std::fmt::Debug for PreviewScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewScreen")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("saved_to", &self.saved_to)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_navigation_keeps_image() {
        let screen = PreviewScreen::from_navigation(Navigation::Preview {
            image: DynamicImage::new_rgb8(6, 3),
        });
        assert_eq!((screen.image().width(), screen.image().height()), (6, 3));
        assert_eq!(screen.rgb().dimensions(), (6, 3));
        assert!(screen.saved_to().is_none());
    }
}
