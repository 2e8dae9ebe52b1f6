// SPDX-License-Identifier: MPL-2.0
//! Playback clock port definition.

use std::sync::Arc;

/// A monotonic playback clock with a settable position and rate.
///
/// Rate `0.0` halts the clock; `1.0` advances it in real time. Implementations
/// must be callable concurrently from the caller's thread (pause/resume), the
/// decode worker (position reset) and the presentation thread (reads).
pub trait PlaybackClock: Send + Sync {
    /// Current position in seconds.
    fn position(&self) -> f64;

    /// Moves the clock to `secs`, keeping the current rate.
    fn set_position(&self, secs: f64);

    /// Current rate.
    fn rate(&self) -> f64;

    /// Changes the rate without moving the position.
    fn set_rate(&self, rate: f64);

    /// Returns true if the clock is advancing.
    fn is_running(&self) -> bool {
        self.rate() > 0.0
    }
}

/// A clock shared between the player, its worker and its sink.
pub type SharedClock = Arc<dyn PlaybackClock>;
