// SPDX-License-Identifier: MPL-2.0
//! Media inspection for NotchLC files.
//!
//! This module answers questions about a file before (or instead of)
//! playing it: may it be played, how long is it, what does it contain.
//! Frame decoding itself lives in [`crate::infrastructure::ffmpeg`].

pub mod codec_gate;
pub mod duration;
pub mod frame_export;
pub mod video;

// Re-export commonly used types
pub use codec_gate::{accepts, fourcc_to_string, is_allowed_codec};
pub use duration::{
    average_frame_rate, estimate, format_duration, frame_accurate_duration, precise_estimate,
    DurationProbe, Ratio,
};
pub use frame_export::{generate_default_filename, ExportFormat};
pub use video::{init_ffmpeg, probe, MediaProbe};
