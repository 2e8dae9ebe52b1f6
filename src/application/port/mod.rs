// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! This module defines abstract interfaces that infrastructure adapters implement.
//! These traits use only domain types, so the pacing engine can be driven by
//! scripted in-memory sources in tests.
//!
//! # Available Ports
//!
//! - [`video`]: Codec gate, duration estimate and frame pulling
//! - [`clock`]: Shared playback clock
//! - [`presentation`]: Frame presentation sink
//!
//! # Design Notes
//!
//! - All traits use domain types only (no `FFmpeg` types)
//! - Frame sources are `Send` but not `Sync`: one thread owns them
//! - The clock is `Send + Sync` and internally synchronized

pub mod clock;
pub mod presentation;
pub mod video;

// Re-export main types for convenience
pub use clock::{PlaybackClock, SharedClock};
pub use presentation::PresentationSink;
pub use video::{FrameSource, MediaBackend};
