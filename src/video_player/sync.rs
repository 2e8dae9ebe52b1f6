// SPDX-License-Identifier: MPL-2.0
//! Playback clock for frame pacing.
//!
//! [`SyncClock`] is the reference [`PlaybackClock`]: a wall-clock anchored
//! position that advances at a settable rate. The decode worker resets it,
//! the caller's thread pauses and resumes it, the presentation thread reads
//! it. All three may do so concurrently.
//!
//! # Model
//!
//! ```text
//! position(now) = anchor.position + (now - anchor.at) * anchor.rate
//! ```
//!
//! Every mutation re-anchors, so changing the rate never makes the
//! position jump.

use crate::application::port::{PlaybackClock, SharedClock};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Anchor {
    position_secs: f64,
    at: Instant,
    rate: f64,
}

impl Anchor {
    fn position_at(&self, now: Instant) -> f64 {
        self.position_secs + now.duration_since(self.at).as_secs_f64() * self.rate
    }
}

/// Wall-clock playback clock with a settable position and rate.
#[derive(Debug)]
pub struct SyncClock {
    anchor: Mutex<Anchor>,
}

impl Default for SyncClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncClock {
    /// Creates a stopped clock at position zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            anchor: Mutex::new(Anchor {
                position_secs: 0.0,
                at: Instant::now(),
                rate: 0.0,
            }),
        }
    }

    // A panic while holding the lock cannot leave the anchor half-written.
    fn lock(&self) -> MutexGuard<'_, Anchor> {
        self.anchor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the clock at the given position.
    pub fn start(&self, position_secs: f64) {
        *self.lock() = Anchor {
            position_secs: sanitize_position(position_secs),
            at: Instant::now(),
            rate: 1.0,
        };
    }

    /// Pauses the clock, preserving current position.
    pub fn pause(&self) {
        self.set_rate(0.0);
    }

    /// Resumes the clock from the paused position.
    pub fn resume(&self) {
        self.set_rate(1.0);
    }

    /// Stops the clock and resets to the beginning.
    pub fn stop(&self) {
        *self.lock() = Anchor {
            position_secs: 0.0,
            at: Instant::now(),
            rate: 0.0,
        };
    }

    /// Returns whether the clock is advancing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.lock().rate > 0.0
    }
}

impl PlaybackClock for SyncClock {
    fn position(&self) -> f64 {
        self.lock().position_at(Instant::now())
    }

    fn set_position(&self, secs: f64) {
        let mut anchor = self.lock();
        anchor.position_secs = sanitize_position(secs);
        anchor.at = Instant::now();
    }

    fn rate(&self) -> f64 {
        self.lock().rate
    }

    fn set_rate(&self, rate: f64) {
        let rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
        let mut anchor = self.lock();
        let now = Instant::now();
        anchor.position_secs = anchor.position_at(now);
        anchor.at = now;
        anchor.rate = rate;
    }
}

fn sanitize_position(secs: f64) -> f64 {
    if secs.is_finite() {
        secs.max(0.0)
    } else {
        0.0
    }
}

/// Creates a new shared clock.
#[must_use]
pub fn create_sync_clock() -> SharedClock {
    Arc::new(SyncClock::new())
}
