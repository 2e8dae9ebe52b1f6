// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the port traits defined in
//! `application::port`.
//!
//! # Available Adapters
//!
//! - [`ffmpeg`]: Gate, estimate and decode via `FFmpeg` (implements [`MediaBackend`])
//!
//! [`MediaBackend`]: crate::application::port::MediaBackend

pub mod ffmpeg;

// Re-export main types for convenience
pub use ffmpeg::{FfmpegBackend, FfmpegMediaHandle};
