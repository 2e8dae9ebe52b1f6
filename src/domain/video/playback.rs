// SPDX-License-Identifier: MPL-2.0
//! Playback session state machine.
//!
//! This module defines the single state value a playback session is in.
//! Display flags (paused, active) are derived from it; nothing keeps
//! parallel booleans.

use std::fmt;

/// Represents the current state of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No file has been opened yet, or the last one was rejected.
    #[default]
    Idle,
    /// The codec gate and decoder are being set up.
    Opening,
    /// Frames are being pulled and presented.
    Playing,
    /// The clock is halted; the tick only refreshes the position.
    Paused,
    /// End of stream reached; the measured duration is being promoted.
    Draining,
    /// Playback ended or was stopped; no media is held.
    Stopped,
    /// A fatal open or decode error occurred; an explicit open is required.
    Error,
}

impl SessionState {
    /// Returns true if a media handle exists in this state.
    #[must_use]
    pub fn holds_media(self) -> bool {
        matches!(
            self,
            Self::Opening | Self::Playing | Self::Paused | Self::Draining
        )
    }

    /// Returns true if the session is paused.
    #[must_use]
    pub fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Returns true if the session is playing.
    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns true if pause/resume make sense in this state.
    #[must_use]
    pub fn is_pausable(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    /// Returns true if the session is ready for a fresh open.
    #[must_use]
    pub fn is_at_rest(self) -> bool {
        matches!(self, Self::Idle | Self::Stopped | Self::Error)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Opening => "opening",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}
