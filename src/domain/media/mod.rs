// SPDX-License-Identifier: MPL-2.0
//! Media domain types.
//!
//! This module contains decoded frame and stream description types that are
//! independent of any presentation or infrastructure concerns.

pub mod types;

// Re-export commonly used types
pub use types::{DecodedFrame, FramePull, StreamInfo, BYTES_PER_PIXEL};
