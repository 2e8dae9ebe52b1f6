// SPDX-License-Identifier: MPL-2.0
//! A presentation sink without a display.
//!
//! [`HeadlessSink`] waits for each frame's display instant, then records it.
//! While the clock is paused it keeps waiting, so a frame is never shown
//! ahead of a frozen clock for longer than the wait cap.
//! The command-line player and the tests use it; a windowed front-end would
//! provide its own [`PresentationSink`].

use crate::application::port::{PlaybackClock, PresentationSink};
use crate::config::defaults::{MAX_PRESENT_WAIT_MS, PRESENT_POLL_MS};
use crate::domain::media::DecodedFrame;
use crate::domain::video::Seconds;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct SinkStats {
    presented: u64,
    flushes: u64,
    last_pts: Seconds,
    last_frame: Option<DecodedFrame>,
}

/// Read side of a [`HeadlessSink`], usable from any thread.
#[derive(Debug, Clone, Default)]
pub struct SinkMonitor {
    stats: Arc<Mutex<SinkStats>>,
}

impl SinkMonitor {
    fn lock(&self) -> MutexGuard<'_, SinkStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of frames presented so far.
    #[must_use]
    pub fn presented(&self) -> u64 {
        self.lock().presented
    }

    /// Number of flushes received so far.
    #[must_use]
    pub fn flushes(&self) -> u64 {
        self.lock().flushes
    }

    /// Timestamp of the most recently presented frame.
    #[must_use]
    pub fn last_pts(&self) -> Seconds {
        self.lock().last_pts
    }

    /// The frame on screen, if the sink keeps one and nothing flushed it.
    #[must_use]
    pub fn last_frame(&self) -> Option<DecodedFrame> {
        self.lock().last_frame.clone()
    }
}

/// Sink that paces to the clock and records what it was given.
#[derive(Debug)]
pub struct HeadlessSink {
    monitor: SinkMonitor,
    keep_last_frame: bool,
    max_wait: Duration,
    poll: Duration,
}

impl HeadlessSink {
    /// Creates a sink and its monitor.
    ///
    /// With `keep_last_frame`, the most recent frame stays available for
    /// snapshots until the next flush.
    #[must_use]
    pub fn new(keep_last_frame: bool) -> (Self, SinkMonitor) {
        let monitor = SinkMonitor::default();
        let sink = Self {
            monitor: monitor.clone(),
            keep_last_frame,
            max_wait: Duration::from_millis(MAX_PRESENT_WAIT_MS),
            poll: Duration::from_millis(PRESENT_POLL_MS),
        };
        (sink, monitor)
    }

    /// Sleeps until the clock reaches `pts`, re-reading it every poll
    /// interval so pauses, resumes and rate changes take effect.
    fn wait_until_due(&self, pts: Seconds, clock: &dyn PlaybackClock) {
        let Some(pts) = pts.get() else {
            return;
        };
        let deadline = Instant::now() + self.max_wait;
        loop {
            let ahead = pts - clock.position();
            if ahead <= 0.0 {
                return;
            }
            let Some(left) = deadline.checked_duration_since(Instant::now()) else {
                tracing::trace!(pts, ahead, "present wait capped");
                return;
            };
            let rate = clock.rate();
            let nap = if rate > 0.0 {
                Duration::try_from_secs_f64(ahead / rate).unwrap_or(self.poll)
            } else {
                self.poll
            };
            std::thread::sleep(nap.min(self.poll).min(left));
        }
    }
}

impl PresentationSink for HeadlessSink {
    fn present(&mut self, frame: DecodedFrame, pts: Seconds, clock: &dyn PlaybackClock) {
        self.wait_until_due(pts, clock);

        let mut stats = self.monitor.lock();
        stats.presented += 1;
        stats.last_pts = pts;
        if self.keep_last_frame {
            stats.last_frame = Some(frame);
        }
        tracing::trace!(%pts, presented = stats.presented, "frame presented");
    }

    fn flush(&mut self) {
        let mut stats = self.monitor.lock();
        stats.flushes += 1;
        stats.last_frame = None;
        tracing::debug!(flushes = stats.flushes, "sink flushed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video_player::sync::SyncClock;

    fn frame_at(pts: Seconds) -> DecodedFrame {
        DecodedFrame::from_bgra(1, 1, vec![0; 4], pts)
    }

    #[test]
    fn records_presented_frames() {
        let (mut sink, monitor) = HeadlessSink::new(true);
        let clock = SyncClock::new();
        clock.set_position(1.0);

        sink.present(frame_at(Seconds::new(0.0)), Seconds::new(0.0), &clock);
        sink.present(frame_at(Seconds::new(0.5)), Seconds::new(0.5), &clock);

        assert_eq!(monitor.presented(), 2);
        assert_eq!(monitor.last_pts(), Seconds::new(0.5));
        assert!(monitor.last_frame().is_some());
    }

    #[test]
    fn paused_clock_holds_a_future_frame_until_the_cap() {
        let (mut sink, monitor) = HeadlessSink::new(false);
        let clock = SyncClock::new();

        let started = Instant::now();
        sink.present(frame_at(Seconds::new(100.0)), Seconds::new(100.0), &clock);

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(MAX_PRESENT_WAIT_MS));
        assert!(elapsed < Duration::from_secs(2));
        assert_eq!(monitor.presented(), 1);
        assert!(monitor.last_frame().is_none());
    }

    #[test]
    fn due_frame_on_a_paused_clock_is_presented_at_once() {
        let (mut sink, monitor) = HeadlessSink::new(false);
        let clock = SyncClock::new();
        clock.set_position(5.0);

        let started = Instant::now();
        sink.present(frame_at(Seconds::new(4.0)), Seconds::new(4.0), &clock);

        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(monitor.presented(), 1);
    }

    #[test]
    fn resuming_releases_a_held_frame() {
        let (mut sink, monitor) = HeadlessSink::new(false);
        let clock = std::sync::Arc::new(SyncClock::new());

        let resumer = {
            let clock = std::sync::Arc::clone(&clock);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(30));
                clock.resume();
            })
        };

        let started = Instant::now();
        sink.present(frame_at(Seconds::new(0.05)), Seconds::new(0.05), clock.as_ref());
        let elapsed = started.elapsed();
        resumer.join().expect("resumer thread panicked");

        // 30 ms paused, then 50 ms of running clock.
        assert!(elapsed >= Duration::from_millis(70), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(MAX_PRESENT_WAIT_MS), "{elapsed:?}");
        assert!(clock.position() >= 0.05);
        assert_eq!(monitor.presented(), 1);
    }

    #[test]
    fn wait_is_capped() {
        let (mut sink, _monitor) = HeadlessSink::new(false);
        let clock = SyncClock::new();
        clock.start(0.0);

        let started = Instant::now();
        sink.present(frame_at(Seconds::new(60.0)), Seconds::new(60.0), &clock);

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(MAX_PRESENT_WAIT_MS));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[test]
    fn flush_clears_last_frame() {
        let (mut sink, monitor) = HeadlessSink::new(true);
        let clock = SyncClock::new();
        sink.present(frame_at(Seconds::UNKNOWN), Seconds::UNKNOWN, &clock);
        sink.flush();

        assert_eq!(monitor.flushes(), 1);
        assert!(monitor.last_frame().is_none());
        assert!(!monitor.last_pts().is_known());
    }
}
