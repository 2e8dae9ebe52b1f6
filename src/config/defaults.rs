// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **Playback**: Frame rate fallback and loop behavior
//! - **Pacing**: Due tolerance (tick and lookahead floors live in
//!   [`interval_bounds`])
//! - **Decoding**: Drain tolerance
//! - **Duration**: Precise end-of-stream scan limits
//! - **Presentation**: Sink wait cap and queue depth
//! - **Logging**: Default filter

use crate::domain::video::interval_bounds;

// ==========================================================================
// Playback Defaults
// ==========================================================================

/// Frame rate assumed when a stream declares none.
pub const DEFAULT_FRAME_RATE: f64 = interval_bounds::DEFAULT_FRAME_RATE;

/// Minimum configurable fallback frame rate.
pub const MIN_FRAME_RATE: f64 = 1.0;

/// Maximum configurable fallback frame rate.
pub const MAX_FRAME_RATE: f64 = 240.0;

/// Whether playback restarts at end of stream by default.
pub const DEFAULT_LOOP_PLAYBACK: bool = false;

// ==========================================================================
// Pacing Defaults
// ==========================================================================

/// A pending frame is due when its timestamp is within this much of the clock.
pub const DUE_EPSILON_SECS: f64 = 0.002;

// ==========================================================================
// Decoding Defaults
// ==========================================================================

/// How many "again" answers a draining decoder may give before it is
/// considered exhausted.
pub const DRAIN_RETRY_LIMIT: u32 = 16;

// ==========================================================================
// Duration Probe Defaults
// ==========================================================================

/// Maximum packets read per window during the precise duration scan.
pub const PRECISE_SCAN_PACKET_CAP: usize = 10_000;

/// Offsets back from the declared end tried by the precise scan (in seconds).
pub const PRECISE_SCAN_WINDOWS_SECS: [f64; 3] = [0.0, 5.0, 30.0];

// ==========================================================================
// Presentation Defaults
// ==========================================================================

/// Longest a sink sleeps waiting for a frame's display instant (in milliseconds).
pub const MAX_PRESENT_WAIT_MS: u64 = 250;

/// How often a waiting sink re-reads the clock (in milliseconds).
pub const PRESENT_POLL_MS: u64 = 5;

/// Frames queued for the presentation thread before new ones are dropped.
pub const PRESENT_QUEUE_DEPTH: usize = 8;

// ==========================================================================
// Logging Defaults
// ==========================================================================

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    assert!(MIN_FRAME_RATE > 0.0);
    assert!(MAX_FRAME_RATE >= MIN_FRAME_RATE);
    assert!(DEFAULT_FRAME_RATE >= MIN_FRAME_RATE);
    assert!(DEFAULT_FRAME_RATE <= MAX_FRAME_RATE);

    assert!(interval_bounds::MIN_TICK_SECS > 0.0);
    assert!(DUE_EPSILON_SECS >= 0.0);
    assert!(interval_bounds::MIN_LOOKAHEAD_SECS > DUE_EPSILON_SECS);

    assert!(DRAIN_RETRY_LIMIT > 0);
    assert!(PRECISE_SCAN_PACKET_CAP > 0);
    assert!(MAX_PRESENT_WAIT_MS > 0);
    assert!(PRESENT_POLL_MS > 0 && PRESENT_POLL_MS < MAX_PRESENT_WAIT_MS);
    assert!(PRESENT_QUEUE_DEPTH > 0);
};
