// SPDX-License-Identifier: MPL-2.0
//! Time unit conversion and formatting utilities.
//!
//! # Constants
//!
//! - `MICROS_PER_SECOND`: 1,000,000 (f64 for calculations)

use crate::domain::video::Seconds;

/// Microseconds per second as f64 for calculations.
pub const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Label shown for an unknown duration or position.
pub const UNKNOWN_LABEL: &str = "--:--";

/// Converts seconds to microseconds.
///
/// # Examples
///
/// ```
/// use notchlc_player::video_player::time_units::secs_to_micros;
///
/// assert_eq!(secs_to_micros(1.0), 1_000_000.0);
/// assert_eq!(secs_to_micros(0.5), 500_000.0);
/// ```
#[inline]
#[must_use]
pub fn secs_to_micros(secs: f64) -> f64 {
    secs * MICROS_PER_SECOND
}

/// Converts microseconds to seconds (f64).
///
/// # Examples
///
/// ```
/// use notchlc_player::video_player::time_units::micros_to_secs;
///
/// assert_eq!(micros_to_secs(1_000_000.0), 1.0);
/// assert_eq!(micros_to_secs(500_000.0), 0.5);
/// ```
#[inline]
#[must_use]
pub fn micros_to_secs(micros: f64) -> f64 {
    micros / MICROS_PER_SECOND
}

/// Formats a time as `M:SS`, or `H:MM:SS` past one hour.
///
/// Unknown values render as `--:--`, never as `0:00`.
///
/// # Examples
///
/// ```
/// use notchlc_player::domain::video::Seconds;
/// use notchlc_player::video_player::time_units::format_duration_label;
///
/// assert_eq!(format_duration_label(Seconds::new(75.4)), "1:15");
/// assert_eq!(format_duration_label(Seconds::UNKNOWN), "--:--");
/// ```
#[must_use]
pub fn format_duration_label(secs: Seconds) -> String {
    let Some(secs) = secs.get() else {
        return UNKNOWN_LABEL.to_string();
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = secs.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
