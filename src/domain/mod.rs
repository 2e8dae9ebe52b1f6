// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core playback types with ZERO external dependencies.
//!
//! This module contains pure domain types, value objects, and business rules.
//! It has no dependencies on external crates (except `std`) to ensure
//! testability and architectural purity.
//!
//! # Modules
//!
//! - [`error`]: Domain error types ([`VideoError`](error::VideoError))
//! - [`media`]: Decoded media types ([`DecodedFrame`](media::DecodedFrame),
//!   [`FramePull`](media::FramePull), [`StreamInfo`](media::StreamInfo))
//! - [`video`]: Playback types ([`SessionState`](video::SessionState),
//!   [`Seconds`](video::Seconds), [`FrameInterval`](video::FrameInterval))

pub mod error;
pub mod media;
pub mod video;
