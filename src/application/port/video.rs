// SPDX-License-Identifier: MPL-2.0
//! Video decoding port definition.
//!
//! This module defines the [`MediaBackend`] and [`FrameSource`] traits.
//! Infrastructure adapters (like `FFmpeg`) implement them.
//!
//! # Design Notes
//!
//! - The frame source is **stateful**: each pull advances the stream
//! - Methods are blocking; the player calls them from its own worker thread
//! - Sources never seek; looping reopens the file
//! - Uses domain types only (`DecodedFrame`, `StreamInfo`, `VideoError`)

use crate::domain::error::VideoError;
use crate::domain::media::{FramePull, StreamInfo};
use crate::domain::video::Seconds;
use std::path::Path;

// =============================================================================
// FrameSource Trait
// =============================================================================

/// An opened media handle that yields decoded frames in decode order.
///
/// # Lifecycle
///
/// 1. Obtained from [`MediaBackend::open`]
/// 2. `next_frame()` called repeatedly until [`FramePull::EndOfStream`]
/// 3. `close()` releases decoder resources; further pulls report end of stream
///
/// # Thread Safety
///
/// Implementations must be `Send` so the worker can own them. They are
/// **not** required to be `Sync`.
pub trait FrameSource: Send {
    /// Returns the stream properties captured at open.
    fn stream_info(&self) -> &StreamInfo;

    /// Pulls the next decoded frame.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::DecodingFailed`] on a hard demux or decode error.
    fn next_frame(&mut self) -> Result<FramePull, VideoError>;

    /// Releases all resources. Idempotent.
    fn close(&mut self);
}

// =============================================================================
// MediaBackend Trait
// =============================================================================

/// Entry point to a media stack: gate, estimate and open.
pub trait MediaBackend: Send + 'static {
    /// Returns whether the file's primary video stream may be played.
    ///
    /// `Ok(false)` covers foreign codecs and files without a video stream.
    ///
    /// # Errors
    ///
    /// Returns a [`VideoError`] if the container cannot be opened or probed.
    fn accepts(&self, path: &Path) -> Result<bool, VideoError>;

    /// Best-effort duration estimate for display. Never fails.
    fn estimate_duration(&self, path: &Path) -> Seconds;

    /// Opens a decoder for the file's primary video stream.
    ///
    /// # Errors
    ///
    /// Returns a [`VideoError`] if the container, stream or decoder cannot be
    /// opened.
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, VideoError>;
}
