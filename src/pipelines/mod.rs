// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for still capture
//!
//! Capture work runs off the UI thread so the live preview keeps streaming
//! while a photo is grabbed and encoded.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │ Still source │ ──▶ │   Photo output    │ ──▶ │ PendingCapture   │
//! │ (device)     │     │  - grab frame     │     │ (oneshot result) │
//! │              │     │  - encode JPEG    │     │                  │
//! └──────────────┘     └───────────────────┘     └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: photo output sink and encoding

pub mod photo;
