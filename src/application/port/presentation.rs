// SPDX-License-Identifier: MPL-2.0
//! Presentation sink port definition.

use crate::application::port::clock::PlaybackClock;
use crate::domain::media::DecodedFrame;
use crate::domain::video::Seconds;

/// Receives frames from the pacing engine.
///
/// The sink runs on its own thread and is handed frames in presentation
/// order. It may use the clock to wait for the exact display instant.
///
/// Implementations must tolerate:
/// - increasing timestamps (with occasional unknown ones)
/// - a `flush` between files and on stop
/// - long stretches with no frames while paused
pub trait PresentationSink: Send + 'static {
    /// Displays (or records) one frame.
    fn present(&mut self, frame: DecodedFrame, pts: Seconds, clock: &dyn PlaybackClock);

    /// Drops any queued or displayed content.
    fn flush(&mut self);
}
