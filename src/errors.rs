// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture screen
//!
//! Each layer has its own error enum:
//!
//! - [`BackendError`](crate::backends::camera::BackendError): camera hardware access
//! - [`PhotoError`]: the photo output sink, encoding and saving
//! - [`ScreenError`]: requests the capture screen refuses to carry out
//! - [`ConfigError`]: loading and saving the configuration file
//!
//! None of these reach the end user through the UI; they are logged, or
//! returned to programmatic callers such as the CLI.

use crate::backends::camera::{BackendError, CameraPosition};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for photo sink operations
pub type PhotoResult<T> = Result<T, PhotoError>;

/// Result type for capture screen requests
pub type ScreenResult<T> = Result<T, ScreenError>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Camera error: {0}")]
    Backend(#[from] BackendError),
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    #[error("{0}")]
    Screen(#[from] ScreenError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Photo capture errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhotoError {
    /// The output is not attached to a session with an input
    #[error("Photo output is not connected to a camera input")]
    NotConnected,
    /// Capture failed inside the backend
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
    /// The capture worker went away without reporting
    #[error("Capture worker exited without a result")]
    WorkerGone,
    /// Encoding failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
    /// Save failed
    #[error("Save failed: {0}")]
    SaveFailed(String),
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

impl From<BackendError> for PhotoError {
    fn from(err: BackendError) -> Self {
        PhotoError::CaptureFailed(err.to_string())
    }
}

/// Requests refused by the capture screen
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScreenError {
    /// A capture request is still outstanding
    #[error("A photo capture is already in progress")]
    CaptureInProgress,
    /// The session has no photo output attached
    #[error("No photo output is attached to the session")]
    NoPhotoOutput,
    /// No camera exists for the requested facing
    #[error("No {0} camera available")]
    NoDevice(CameraPosition),
    #[error(transparent)]
    Photo(#[from] PhotoError),
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed configuration in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}
