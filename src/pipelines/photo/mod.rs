// SPDX-License-Identifier: MPL-2.0

//! Photo capture pipeline
//!
//! ```text
//! StillSource → worker thread → Encoding → oneshot → UI thread
//!       ↓
//! Preview continues uninterrupted
//! ```
//!
//! The photo output hands back encoded file data; decoding for display and
//! saving to disk happen in the preview screen.

pub mod capture;
pub mod encoding;

pub use capture::{CapturedPhoto, PendingCapture, PhotoOutput, PhotoSettings};
pub use encoding::{EncodingQuality, PhotoCodec, encode_frame, encode_image};
