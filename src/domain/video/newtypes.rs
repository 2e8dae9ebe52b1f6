// SPDX-License-Identifier: MPL-2.0
//! Video playback newtypes.
//!
//! This module provides type-safe wrappers for playback values,
//! ensuring they are always within valid ranges.

use std::fmt;
use std::time::Duration;

// =============================================================================
// Seconds
// =============================================================================

/// A time value in seconds that may be unknown.
///
/// Unknown is stored as a non-finite sentinel (NaN) and is never coerced
/// to zero. Use [`Seconds::get`] to branch on it.
///
/// # Example
///
/// ```
/// use notchlc_player::domain::video::Seconds;
///
/// assert_eq!(Seconds::new(2.5).get(), Some(2.5));
/// assert_eq!(Seconds::UNKNOWN.get(), None);
/// assert_eq!(Seconds::positive(0.0).get(), None);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Seconds(f64);

impl Seconds {
    /// The unknown sentinel.
    pub const UNKNOWN: Self = Self(f64::NAN);

    /// Zero seconds.
    pub const ZERO: Self = Self(0.0);

    /// Wraps a raw value. Non-finite values become [`Seconds::UNKNOWN`].
    #[must_use]
    pub fn new(secs: f64) -> Self {
        if secs.is_finite() {
            Self(secs)
        } else {
            Self::UNKNOWN
        }
    }

    /// Wraps a value only if it is finite and strictly positive.
    ///
    /// Durations use this: a zero or negative declared duration is as good
    /// as no duration at all.
    #[must_use]
    pub fn positive(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self(secs)
        } else {
            Self::UNKNOWN
        }
    }

    /// Returns true unless this is the unknown sentinel.
    #[must_use]
    pub fn is_known(self) -> bool {
        self.0.is_finite()
    }

    /// Returns the value, or `None` when unknown.
    #[must_use]
    pub fn get(self) -> Option<f64> {
        self.is_known().then_some(self.0)
    }

    /// Returns the raw value, NaN when unknown.
    #[must_use]
    pub fn raw(self) -> f64 {
        self.0
    }

    /// Returns `self` if known, otherwise `fallback`.
    #[must_use]
    pub fn or(self, fallback: Seconds) -> Seconds {
        if self.is_known() {
            self
        } else {
            fallback
        }
    }

    /// Returns `self` if known, otherwise evaluates `fallback`.
    #[must_use]
    pub fn or_else(self, fallback: impl FnOnce() -> Seconds) -> Seconds {
        if self.is_known() {
            self
        } else {
            fallback()
        }
    }
}

impl Default for Seconds {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl PartialEq for Seconds {
    /// Two unknown values compare equal; the sentinel is a state, not a number.
    fn eq(&self, other: &Self) -> bool {
        match (self.get(), other.get()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => true,
            _ => false,
        }
    }
}

impl From<f64> for Seconds {
    fn from(secs: f64) -> Self {
        Self::new(secs)
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(secs) => write!(f, "{secs:.3}s"),
            None => write!(f, "unknown"),
        }
    }
}

// =============================================================================
// FrameInterval
// =============================================================================

/// Tick interval bounds.
pub mod interval_bounds {
    /// Frame rate assumed when the stream does not declare one.
    pub const DEFAULT_FRAME_RATE: f64 = 30.0;
    /// Shortest allowed tick period (500 Hz).
    pub const MIN_TICK_SECS: f64 = 0.002;
    /// Smallest lookahead budget, whatever the frame rate.
    pub const MIN_LOOKAHEAD_SECS: f64 = 0.004;
}

/// Period of the pacing tick, derived from a stream's frame rate.
///
/// Always at least [`interval_bounds::MIN_TICK_SECS`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInterval(f64);

impl FrameInterval {
    /// Interval for the given frame rate, falling back to
    /// [`interval_bounds::DEFAULT_FRAME_RATE`] when unknown.
    #[must_use]
    pub fn from_frame_rate(frame_rate: Option<f64>) -> Self {
        Self::with_fallback(frame_rate, interval_bounds::DEFAULT_FRAME_RATE)
    }

    /// Interval for the given frame rate, falling back to `fallback_rate`.
    ///
    /// Non-finite or non-positive rates count as unknown. If the fallback is
    /// unusable too, the default frame rate is used.
    #[must_use]
    pub fn with_fallback(frame_rate: Option<f64>, fallback_rate: f64) -> Self {
        let usable = |rate: f64| rate.is_finite() && rate > 0.0;
        let rate = match frame_rate {
            Some(rate) if usable(rate) => rate,
            _ if usable(fallback_rate) => fallback_rate,
            _ => interval_bounds::DEFAULT_FRAME_RATE,
        };
        Self((1.0 / rate).max(interval_bounds::MIN_TICK_SECS))
    }

    /// Returns the interval in seconds.
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0
    }

    /// Returns the interval as a `Duration`.
    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_secs_f64(self.0)
    }

    /// How far a decoded frame may lead the clock before it is held back.
    ///
    /// Half a frame interval, floored at [`interval_bounds::MIN_LOOKAHEAD_SECS`].
    #[must_use]
    pub fn lookahead_secs(self) -> f64 {
        (self.0 / 2.0).max(interval_bounds::MIN_LOOKAHEAD_SECS)
    }
}

impl Default for FrameInterval {
    fn default() -> Self {
        Self::from_frame_rate(None)
    }
}
