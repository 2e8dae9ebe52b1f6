// SPDX-License-Identifier: MPL-2.0
//! Duration estimation without decoding the whole stream.
//!
//! Container metadata for NotchLC files is often incomplete, so several
//! strategies are layered. [`DurationProbe`] captures the raw metadata once;
//! every strategy is a pure method on it, which keeps the cascade testable
//! without media files.
//!
//! [`precise_estimate`] is the expensive alternative: it seeks near the end
//! and reads packet timestamps.

use crate::config::defaults::{PRECISE_SCAN_PACKET_CAP, PRECISE_SCAN_WINDOWS_SECS};
use crate::domain::video::Seconds;
use crate::media::video::open_input;
use crate::video_player::time_units::micros_to_secs;
use ffmpeg_next::format::context::Input;
use std::os::raw::c_int;
use std::path::Path;
use tracing::{debug, trace};

// =============================================================================
// Ratio
// =============================================================================

/// A rational number as stored by the demuxer (time bases, frame rates).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ratio {
    pub num: i32,
    pub den: i32,
}

impl Ratio {
    #[must_use]
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Returns true if both terms are strictly positive.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.num > 0 && self.den > 0
    }

    /// Returns `num / den`, or `None` unless both terms are positive.
    #[must_use]
    pub fn to_f64(self) -> Option<f64> {
        self.is_valid()
            .then(|| f64::from(self.num) / f64::from(self.den))
    }
}

impl From<ffmpeg_next::Rational> for Ratio {
    fn from(r: ffmpeg_next::Rational) -> Self {
        Self::new(r.numerator(), r.denominator())
    }
}

/// Converts a container duration in microseconds to stream ticks, rounding
/// to nearest.
#[must_use]
pub fn micros_to_ticks(micros: i64, time_base: Ratio) -> Option<i64> {
    if !time_base.is_valid() {
        return None;
    }
    let numerator = i128::from(micros) * i128::from(time_base.den);
    let denominator = 1_000_000_i128 * i128::from(time_base.num);
    let ticks = (numerator + denominator / 2).div_euclid(denominator);
    i64::try_from(ticks).ok()
}

// =============================================================================
// DurationProbe
// =============================================================================

/// Raw duration-related metadata of a container and its best video stream.
///
/// Missing values are zero (or negative, as `FFmpeg` reports "no value").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationProbe {
    /// Container duration in microseconds.
    pub container_duration_us: i64,
    /// Whether a video stream was found. Stream fields are zero otherwise.
    pub has_video: bool,
    /// Stream duration in `time_base` ticks.
    pub stream_duration: i64,
    /// Stream time base.
    pub time_base: Ratio,
    /// Declared number of frames.
    pub frame_count: i64,
    /// Average frame rate.
    pub avg_frame_rate: Ratio,
    /// Real base frame rate, used when the average is absent.
    pub base_frame_rate: Ratio,
    /// Container bit rate in bits per second.
    pub bit_rate: i64,
    /// File size in bytes.
    pub file_size: u64,
}

impl DurationProbe {
    /// Reads the metadata of an opened container.
    pub(crate) fn from_input(input: &Input, path: &Path) -> Self {
        let mut probe = Self {
            container_duration_us: input.duration(),
            bit_rate: input.bit_rate(),
            file_size: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            ..Self::default()
        };

        if let Some(stream) = input.streams().best(ffmpeg_next::media::Type::Video) {
            probe.has_video = true;
            probe.stream_duration = stream.duration();
            probe.time_base = stream.time_base().into();
            probe.frame_count = stream.frames();
            probe.avg_frame_rate = stream.avg_frame_rate().into();
            probe.base_frame_rate = stream.rate().into();
        }

        probe
    }

    /// Average frame rate, falling back to the base frame rate.
    #[must_use]
    pub fn frame_rate(&self) -> Option<f64> {
        self.avg_frame_rate
            .to_f64()
            .or_else(|| self.base_frame_rate.to_f64())
    }

    fn frame_rate_ratio(&self) -> Ratio {
        if self.avg_frame_rate.num > 0 {
            self.avg_frame_rate
        } else {
            self.base_frame_rate
        }
    }

    /// Strategy 1: container-level declared duration.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn container_seconds(&self) -> Seconds {
        if self.container_duration_us > 0 {
            Seconds::positive(micros_to_secs(self.container_duration_us as f64))
        } else {
            Seconds::UNKNOWN
        }
    }

    /// Strategy 2: stream duration converted through its time base.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stream_seconds(&self) -> Seconds {
        match self.time_base.to_f64() {
            Some(tb) if self.stream_duration > 0 => {
                Seconds::positive(self.stream_duration as f64 * tb)
            }
            _ => Seconds::UNKNOWN,
        }
    }

    /// Strategy 3: frame count divided by frame rate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn frame_count_seconds(&self) -> Seconds {
        match self.frame_rate() {
            Some(fps) if self.frame_count > 0 => Seconds::positive(self.frame_count as f64 / fps),
            _ => Seconds::UNKNOWN,
        }
    }

    /// Strategy 4: file size over bit rate. Very rough.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bitrate_seconds(&self) -> Seconds {
        if self.bit_rate > 0 && self.file_size > 0 {
            Seconds::positive(self.file_size as f64 * 8.0 / self.bit_rate as f64)
        } else {
            Seconds::UNKNOWN
        }
    }

    /// Runs the cascade; the first finite positive result wins.
    #[must_use]
    pub fn estimate(&self) -> Seconds {
        self.container_seconds()
            .or_else(|| self.stream_seconds())
            .or_else(|| self.frame_count_seconds())
            .or_else(|| self.bitrate_seconds())
    }

    /// Frame count times the exact frame period, else stream duration.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn frame_accurate(&self) -> Seconds {
        let rate = self.frame_rate_ratio();
        if rate.is_valid() && self.frame_count > 0 {
            Seconds::positive(
                self.frame_count as f64 * (f64::from(rate.den) / f64::from(rate.num)),
            )
        } else {
            self.stream_seconds()
        }
    }

    /// Duration an opened decoder declares: container, else stream.
    #[must_use]
    pub fn declared(&self) -> Seconds {
        self.container_seconds().or_else(|| self.stream_seconds())
    }
}

// =============================================================================
// Path-based probes
// =============================================================================

fn read_probe(path: &Path) -> Option<DurationProbe> {
    match open_input(path) {
        Ok(input) => Some(DurationProbe::from_input(&input, path)),
        Err(err) => {
            debug!(path = %path.display(), %err, "duration probe failed");
            None
        }
    }
}

/// Best-effort duration estimate for display. Unknown on any failure.
#[must_use]
pub fn estimate(path: &Path) -> Seconds {
    read_probe(path).map_or(Seconds::UNKNOWN, |probe| probe.estimate())
}

/// Frame-count based duration, else stream duration.
#[must_use]
pub fn frame_accurate_duration(path: &Path) -> Seconds {
    read_probe(path).map_or(Seconds::UNKNOWN, |probe| probe.frame_accurate())
}

/// Container-level duration only.
#[must_use]
pub fn format_duration(path: &Path) -> Seconds {
    read_probe(path).map_or(Seconds::UNKNOWN, |probe| probe.container_seconds())
}

/// Average frame rate of the best video stream, else its base rate.
#[must_use]
pub fn average_frame_rate(path: &Path) -> Option<f64> {
    read_probe(path).and_then(|probe| probe.frame_rate())
}

// =============================================================================
// Precise scan
// =============================================================================

/// Duration from the last video packet timestamp near the end of the file.
///
/// Seeks close to the end, then reads forward at most
/// [`PRECISE_SCAN_PACKET_CAP`] packets per window and keeps the largest
/// video timestamp seen. Falls back to the metadata cascade of [`estimate`]
/// when no timestamp can be read. A file without a video stream reports its
/// container duration.
#[must_use]
pub fn precise_estimate(path: &Path) -> Seconds {
    match open_input(path) {
        Ok(mut input) => precise_scan(&mut input, path),
        Err(err) => {
            debug!(path = %path.display(), %err, "precise scan could not open file");
            Seconds::UNKNOWN
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn precise_scan(input: &mut Input, path: &Path) -> Seconds {
    let probe = DurationProbe::from_input(input, path);
    let Some(index) = input
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .map(|s| s.index())
    else {
        return probe.container_seconds();
    };
    let Some(tb) = probe.time_base.to_f64() else {
        return probe.estimate();
    };

    let mut max_ts = None;
    for window in PRECISE_SCAN_WINDOWS_SECS {
        if !seek_to_end(input, index, &probe) {
            debug!(path = %path.display(), "every seek fallback failed");
            break;
        }

        if window > 0.0 {
            let step = ((window / tb) as i64).max(1);
            let target = if probe.container_duration_us > 0 {
                micros_to_ticks(probe.container_duration_us, probe.time_base)
            } else if probe.stream_duration > 0 {
                Some(probe.stream_duration)
            } else {
                None
            };
            if let Some(target) = target {
                // A failed step back still leaves us at the end.
                let _ = seek_frame(input, index, (target - step).max(0));
            }
        }

        max_ts = scan_max_timestamp(input, index);
        trace!(window, ?max_ts, "precise scan window");
        if max_ts.is_some() {
            break;
        }
    }

    scanned_duration(max_ts, tb, &probe)
}

/// Turns the largest scanned timestamp into seconds, or runs the cascade.
#[allow(clippy::cast_precision_loss)]
fn scanned_duration(max_ts: Option<i64>, time_base: f64, probe: &DurationProbe) -> Seconds {
    max_ts
        .map_or(Seconds::UNKNOWN, |ts| Seconds::positive(ts as f64 * time_base))
        .or_else(|| probe.estimate())
}

/// Seeks near the end, trying each fallback in turn.
fn seek_to_end(input: &mut Input, index: usize, probe: &DurationProbe) -> bool {
    // SAFETY: the format context is valid while `input` is mutably borrowed.
    let as_far_as_possible = unsafe {
        ffmpeg_next::ffi::avformat_seek_file(
            input.as_mut_ptr(),
            stream_index(index),
            i64::MIN,
            i64::MAX,
            i64::MAX,
            ffmpeg_next::ffi::AVSEEK_FLAG_BACKWARD as c_int,
        )
    };
    if as_far_as_possible >= 0 {
        return true;
    }

    if probe.container_duration_us > 0 {
        if let Some(ts) = micros_to_ticks(probe.container_duration_us - 1, probe.time_base) {
            if seek_frame(input, index, ts) {
                return true;
            }
        }
    }

    if probe.stream_duration > 0 && seek_frame(input, index, probe.stream_duration - 1) {
        return true;
    }

    seek_frame(input, index, 0)
}

fn seek_frame(input: &mut Input, index: usize, ts: i64) -> bool {
    // SAFETY: the format context is valid while `input` is mutably borrowed.
    let ret = unsafe {
        ffmpeg_next::ffi::av_seek_frame(
            input.as_mut_ptr(),
            stream_index(index),
            ts,
            ffmpeg_next::ffi::AVSEEK_FLAG_BACKWARD as c_int,
        )
    };
    ret >= 0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn stream_index(index: usize) -> c_int {
    index as c_int
}

/// Reads forward and returns the largest video packet timestamp (pts, else dts).
fn scan_max_timestamp(input: &mut Input, index: usize) -> Option<i64> {
    let mut timestamps = Vec::new();
    for _ in 0..PRECISE_SCAN_PACKET_CAP {
        let mut packet = ffmpeg_next::Packet::empty();
        if packet.read(input).is_err() {
            break;
        }
        if packet.stream() == index {
            timestamps.push(packet.pts().or_else(|| packet.dts()));
        }
    }
    max_timestamp(timestamps)
}

/// Packets come in decode order, so the last one is not always the latest.
fn max_timestamp(timestamps: impl IntoIterator<Item = Option<i64>>) -> Option<i64> {
    timestamps.into_iter().flatten().max()
}
