// SPDX-License-Identifier: MPL-2.0
//! Application layer - Ports between the pacing engine and its collaborators.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - The playback engine only sees the traits, never `FFmpeg` types
//!
//! # Example
//!
//! ```ignore
//! use notchlc_player::application::port::{FrameSource, MediaBackend};
//!
//! // Infrastructure implements the port traits
//! struct FfmpegBackend;
//! impl MediaBackend for FfmpegBackend { /* ... */ }
//! ```

pub mod port;
