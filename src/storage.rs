// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for saved photos

use crate::constants::APP_DIR_NAME;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default photo directory: `~/Pictures/snapcam`
///
/// Falls back to the home directory, then the working directory, when the
/// platform has no pictures directory.
pub fn photo_directory() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Timestamped file name, `IMG_20260101_120000.jpg`
pub fn photo_filename(extension: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("IMG_{}.{}", timestamp, extension)
}

/// Write encoded photo data into `dir` under a timestamped name
///
/// Creates `dir` if needed. Captures within the same second get a numeric
/// suffix rather than overwriting each other.
pub fn save_photo(data: &[u8], extension: &str, dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let filename = photo_filename(extension);
    let stem = filename.trim_end_matches(&format!(".{}", extension)).to_string();

    let mut suffix = 0u32;
    let (file, path) = loop {
        let candidate = if suffix == 0 {
            dir.join(&filename)
        } else {
            dir.join(format!("{}_{}.{}", stem, suffix, extension))
        };
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => break (file, candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(path = %candidate.display(), "Photo name taken");
                suffix += 1;
            }
            Err(e) => return Err(e),
        }
    };

    write_or_discard(file, &path, data)?;
    info!(path = %path.display(), size = data.len(), "Photo saved");
    Ok(path)
}

/// Write and flush `data`, deleting `path` if that fails
fn write_or_discard(mut file: File, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let result = file.write_all(data).and_then(|()| file.sync_all());
    if let Err(e) = &result {
        drop(file);
        match std::fs::remove_file(path) {
            Ok(()) => warn!(path = %path.display(), error = %e, "Removed partially written photo"),
            Err(remove_err) => {
                warn!(path = %path.display(), error = %remove_err, "Failed to remove partial photo")
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_shape() {
        let name = photo_filename("jpg");
        assert!(name.starts_with("IMG_"));
        assert!(name.ends_with(".jpg"));
        // IMG_ + YYYYMMDD_HHMMSS + .jpg
        assert_eq!(name.len(), 4 + 15 + 4);
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMG_partial.jpg");
        std::fs::write(&path, b"").unwrap();

        // A read-only handle makes the write fail
        let read_only = File::open(&path).unwrap();
        assert!(write_or_discard(read_only, &path, b"jpeg bytes").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_successful_write_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMG_ok.jpg");
        let file = File::create(&path).unwrap();

        write_or_discard(file, &path, b"jpeg bytes").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn test_photo_directory_is_app_folder() {
        assert!(photo_directory().ends_with(APP_DIR_NAME));
    }
}
