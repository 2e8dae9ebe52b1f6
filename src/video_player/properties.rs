// SPDX-License-Identifier: MPL-2.0
//! Observable session properties.
//!
//! Written by the decode worker (position, duration, frame rate, most state
//! transitions) and by the caller's thread (pause/resume). Read from any
//! thread through [`SessionProperties`] snapshots.

use crate::domain::video::{SessionState, Seconds};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A point-in-time copy of the session's observable properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionProperties {
    /// Clock position at the last tick, in seconds.
    pub position: f64,
    /// Best known duration. Unknown until probed or measured.
    pub duration: Seconds,
    /// Declared frame rate of the open stream, if any.
    pub frame_rate: Option<f64>,
    pub state: SessionState,
}

impl SessionProperties {
    /// Returns true if the session is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    /// Returns true if a file is open (playing, paused or restarting).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.holds_media()
    }
}

/// Shared storage behind [`SessionProperties`].
///
/// Floats are stored as their bit patterns; NaN encodes "unknown".
#[derive(Debug)]
pub(crate) struct SharedProperties {
    position: AtomicU64,
    duration: AtomicU64,
    frame_rate: AtomicU64,
    state: Mutex<SessionState>,
}

impl Default for SharedProperties {
    fn default() -> Self {
        Self {
            position: AtomicU64::new(0.0_f64.to_bits()),
            duration: AtomicU64::new(f64::NAN.to_bits()),
            frame_rate: AtomicU64::new(f64::NAN.to_bits()),
            state: Mutex::new(SessionState::Idle),
        }
    }
}

impl SharedProperties {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn snapshot(&self) -> SessionProperties {
        let frame_rate = f64::from_bits(self.frame_rate.load(Ordering::Acquire));
        SessionProperties {
            position: f64::from_bits(self.position.load(Ordering::Acquire)),
            duration: Seconds::new(f64::from_bits(self.duration.load(Ordering::Acquire))),
            frame_rate: frame_rate.is_finite().then_some(frame_rate),
            state: self.state(),
        }
    }

    pub(crate) fn set_position(&self, secs: f64) {
        self.position.store(secs.to_bits(), Ordering::Release);
    }

    pub(crate) fn set_duration(&self, duration: Seconds) {
        self.duration.store(duration.raw().to_bits(), Ordering::Release);
    }

    pub(crate) fn set_frame_rate(&self, frame_rate: Option<f64>) {
        let raw = frame_rate.unwrap_or(f64::NAN);
        self.frame_rate.store(raw.to_bits(), Ordering::Release);
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.lock_state()
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        *self.lock_state() = state;
    }

    /// Applies `transition` to the current state under the lock.
    ///
    /// `transition` returns the new state, or `None` to leave it unchanged.
    /// Returns true if the state changed.
    pub(crate) fn update_state(
        &self,
        transition: impl FnOnce(SessionState) -> Option<SessionState>,
    ) -> bool {
        let mut state = self.lock_state();
        match transition(*state) {
            Some(next) if next != *state => {
                *state = next;
                true
            }
            _ => false,
        }
    }
}
