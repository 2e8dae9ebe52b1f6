// SPDX-License-Identifier: MPL-2.0
//! End-to-end pacing tests against a scripted in-memory backend.
//!
//! No media files are needed: the backend produces tiny frames with
//! evenly spaced timestamps, and the sink records what it was given.

use notchlc_player::application::port::{
    FrameSource, MediaBackend, PlaybackClock, PresentationSink,
};
use notchlc_player::domain::error::VideoError;
use notchlc_player::domain::media::{DecodedFrame, FramePull, StreamInfo};
use notchlc_player::domain::video::{Seconds, SessionState};
use notchlc_player::error::Error;
use notchlc_player::video_player::{OpenOutcome, PlaybackEvent, PlayerOptions, VideoPlayer};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Scripted backend
// =============================================================================

#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    closes: AtomicUsize,
    pulls: AtomicUsize,
}

impl Counters {
    fn open_handles(&self) -> usize {
        self.opens.load(Ordering::SeqCst) - self.closes.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct Script {
    accept: bool,
    open_error: Option<VideoError>,
    frames: usize,
    fps: f64,
    first_pts: f64,
    fail_at: Option<usize>,
}

impl Script {
    fn frames(frames: usize, fps: f64) -> Self {
        Self {
            accept: true,
            open_error: None,
            frames,
            fps,
            first_pts: 0.0,
            fail_at: None,
        }
    }
}

struct ScriptedBackend {
    script: Script,
    counters: Arc<Counters>,
}

struct ScriptedSource {
    script: Script,
    info: StreamInfo,
    next: usize,
    closed: bool,
    counters: Arc<Counters>,
}

impl MediaBackend for ScriptedBackend {
    fn accepts(&self, _path: &Path) -> Result<bool, VideoError> {
        Ok(self.script.accept)
    }

    fn estimate_duration(&self, _path: &Path) -> Seconds {
        Seconds::new(99.0)
    }

    fn open(&self, _path: &Path) -> Result<Box<dyn FrameSource>, VideoError> {
        if let Some(err) = &self.script.open_error {
            return Err(err.clone());
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSource {
            script: self.script.clone(),
            info: StreamInfo {
                width: 2,
                height: 2,
                time_base: Some(1.0 / 90_000.0),
                frame_rate: Some(self.script.fps),
                declared_duration: Seconds::UNKNOWN,
                codec_name: "notchlc".to_string(),
            },
            next: 0,
            closed: false,
            counters: Arc::clone(&self.counters),
        }))
    }
}

impl FrameSource for ScriptedSource {
    fn stream_info(&self) -> &StreamInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<FramePull, VideoError> {
        self.counters.pulls.fetch_add(1, Ordering::SeqCst);
        if self.closed || self.next >= self.script.frames {
            return Ok(FramePull::EndOfStream);
        }
        if self.script.fail_at == Some(self.next) {
            return Err(VideoError::DecodingFailed("corrupt packet".to_string()));
        }
        #[allow(clippy::cast_precision_loss)]
        let pts = self.script.first_pts + self.next as f64 / self.script.fps;
        self.next += 1;
        Ok(FramePull::Frame(DecodedFrame::from_bgra(
            2,
            2,
            vec![0; 16],
            Seconds::new(pts),
        )))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// =============================================================================
// Recording sink
// =============================================================================

#[derive(Default)]
struct Recording {
    presented: Vec<Seconds>,
    flushes: usize,
}

struct RecordingSink(Arc<Mutex<Recording>>);

impl PresentationSink for RecordingSink {
    fn present(&mut self, _frame: DecodedFrame, pts: Seconds, _clock: &dyn PlaybackClock) {
        self.0.lock().expect("recording lock").presented.push(pts);
    }

    fn flush(&mut self) {
        self.0.lock().expect("recording lock").flushes += 1;
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    player: VideoPlayer,
    events: UnboundedReceiver<PlaybackEvent>,
    counters: Arc<Counters>,
    recording: Arc<Mutex<Recording>>,
}

impl Harness {
    fn new(script: Script, loop_playback: bool) -> Self {
        let counters = Arc::new(Counters::default());
        let recording = Arc::new(Mutex::new(Recording::default()));
        let backend = ScriptedBackend {
            script,
            counters: Arc::clone(&counters),
        };
        let options = PlayerOptions {
            loop_playback,
            ..PlayerOptions::default()
        };
        let mut player = VideoPlayer::spawn(backend, RecordingSink(Arc::clone(&recording)), options)
            .expect("player should spawn");
        let events = player.take_events().expect("events available once");
        Self {
            player,
            events,
            counters,
            recording,
        }
    }

    async fn next_event(&mut self) -> PlaybackEvent {
        tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for a playback event")
            .expect("event channel closed")
    }

    async fn wait_for(&mut self, wanted: fn(&PlaybackEvent) -> bool) -> Vec<PlaybackEvent> {
        let mut seen = Vec::new();
        loop {
            let event = self.next_event().await;
            let done = wanted(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    fn presented(&self) -> Vec<Seconds> {
        self.recording.lock().expect("recording lock").presented.clone()
    }

    fn flushes(&self) -> usize {
        self.recording.lock().expect("recording lock").flushes
    }
}

fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + EVENT_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn assert_non_decreasing(pts: &[Seconds]) {
    let known: Vec<f64> = pts.iter().filter_map(|p| p.get()).collect();
    assert!(
        known.windows(2).all(|w| w[0] <= w[1]),
        "timestamps went backwards: {known:?}"
    );
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn plays_every_frame_in_order_then_ends() {
    let mut h = Harness::new(Script::frames(10, 50.0), false);

    let outcome = h.player.open_and_play("clip.mov").expect("open should succeed");
    let info = match outcome {
        OpenOutcome::Playing(info) => info,
        other => panic!("expected playback, got {other:?}"),
    };
    assert_eq!(info.duration.get(), Some(99.0));

    let events = h.wait_for(|e| matches!(e, PlaybackEvent::Ended)).await;
    assert!(matches!(events[0], PlaybackEvent::Opened(_)));
    let measured = events.iter().find_map(|e| match e {
        PlaybackEvent::DurationMeasured { seconds } => Some(*seconds),
        _ => None,
    });
    let measured = measured.expect("duration should be measured at end of stream");
    assert!((0.1..2.0).contains(&measured), "measured {measured}");

    assert!(wait_until(|| h.presented().len() == 10));
    assert_non_decreasing(&h.presented());
    assert_eq!(h.player.state(), SessionState::Stopped);
    assert_eq!(h.player.properties().duration.get(), Some(measured));
    assert_eq!(h.counters.open_handles(), 0);
}

#[tokio::test]
async fn rejected_file_returns_to_idle_without_opening() {
    let mut script = Script::frames(10, 30.0);
    script.accept = false;
    let mut h = Harness::new(script, false);

    let outcome = h.player.open_and_play("/media/holiday.mp4").expect("rejection is not an error");
    assert_eq!(
        outcome,
        OpenOutcome::Rejected {
            display_name: "holiday.mp4".to_string()
        }
    );
    assert_eq!(
        h.next_event().await,
        PlaybackEvent::Rejected {
            display_name: "holiday.mp4".to_string()
        }
    );
    assert_eq!(h.player.state(), SessionState::Idle);
    assert_eq!(h.counters.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pause_is_idempotent_and_freezes_the_clock() {
    let mut h = Harness::new(Script::frames(10_000, 50.0), false);
    h.player.open_and_play("long.mov").expect("open should succeed");
    h.next_event().await;
    std::thread::sleep(Duration::from_millis(60));

    assert!(h.player.pause());
    assert!(!h.player.pause());
    assert_eq!(h.player.state(), SessionState::Paused);
    assert!(h.player.properties().is_paused());

    let clock = h.player.clock();
    assert_eq!(clock.rate(), 0.0);
    let frozen = clock.position();
    std::thread::sleep(Duration::from_millis(30));
    let presented = h.presented().len();
    std::thread::sleep(Duration::from_millis(100));
    assert!((clock.position() - frozen).abs() < 1e-9);
    assert_eq!(h.presented().len(), presented);

    assert!(h.player.resume());
    assert!(!h.player.resume());
    assert_eq!(h.player.state(), SessionState::Playing);
    assert!(h.player.toggle_pause());
    assert_eq!(h.player.state(), SessionState::Paused);
}

#[tokio::test]
async fn looping_restarts_and_promotes_measured_duration() {
    // 5 frames at 50 fps: 0.1 s of media, one frame every 0.02 s.
    let nominal = 0.1;
    let interval = 0.02;
    // Scheduling latency between the worker and this task.
    let slack = 0.04;

    let mut h = Harness::new(Script::frames(5, 50.0), true);
    h.player.open_and_play("short.mov").expect("open should succeed");

    let mut measured = Vec::new();
    let mut loops = 0;
    while loops < 3 {
        match h.next_event().await {
            PlaybackEvent::DurationMeasured { seconds } => measured.push(seconds),
            PlaybackEvent::Looped => {
                loops += 1;
                let position = h.player.clock().position();
                assert!(position < interval + slack, "clock not rewound: {position}");
                let duration = h.player.properties().duration.get();
                assert!(
                    duration.is_some_and(|d| (d - nominal).abs() <= 2.0 * interval + slack),
                    "duration {duration:?}"
                );
            }
            PlaybackEvent::Ended | PlaybackEvent::Error(_) => panic!("looping session stopped"),
            _ => {}
        }
    }

    assert_eq!(measured.len(), 3);
    // End of stream is pulled one tick after the last frame is due.
    assert!(
        measured
            .iter()
            .all(|s| (s - nominal).abs() <= 2.0 * interval + slack),
        "{measured:?}"
    );
    assert!(h.counters.opens.load(Ordering::SeqCst) >= 4);
    assert!(h.counters.open_handles() <= 1);

    h.player.set_loop(false);
    assert!(!h.player.is_loop_enabled());
    h.wait_for(|e| matches!(e, PlaybackEvent::Ended)).await;
    assert_eq!(h.counters.open_handles(), 0);
}

#[tokio::test]
async fn stop_is_synchronous_and_resets_the_clock() {
    let mut h = Harness::new(Script::frames(10_000, 50.0), false);
    h.player.open_and_play("long.mov").expect("open should succeed");
    h.next_event().await;
    std::thread::sleep(Duration::from_millis(50));

    h.player.stop().expect("stop should succeed");

    assert_eq!(h.counters.open_handles(), 0);
    assert_eq!(h.player.state(), SessionState::Stopped);
    let clock = h.player.clock();
    assert_eq!(clock.rate(), 0.0);
    assert_eq!(clock.position(), 0.0);
    assert_eq!(h.player.properties().position, 0.0);
    assert_eq!(h.next_event().await, PlaybackEvent::Stopped);
    assert!(wait_until(|| h.flushes() >= 2));
}

#[tokio::test]
async fn rapid_stop_open_cycling_leaves_no_open_handle() {
    let h = Harness::new(Script::frames(10_000, 100.0), false);

    for i in 0..25 {
        let outcome = h.player.open_and_play(format!("clip{i}.mov")).expect("open");
        assert!(!outcome.is_rejected());
        assert_eq!(h.counters.open_handles(), 1);
        h.player.stop().expect("stop");
        assert_eq!(h.counters.open_handles(), 0);
    }

    assert_eq!(h.counters.opens.load(Ordering::SeqCst), 25);
    assert_eq!(h.player.state(), SessionState::Stopped);
}

#[tokio::test]
async fn reopening_closes_the_previous_session() {
    let h = Harness::new(Script::frames(10_000, 100.0), false);

    h.player.open_and_play("a.mov").expect("open a");
    h.player.open_and_play("b.mov").expect("open b");

    assert_eq!(h.counters.opens.load(Ordering::SeqCst), 2);
    assert_eq!(h.counters.open_handles(), 1);
    assert_eq!(h.player.state(), SessionState::Playing);
}

#[tokio::test]
async fn decode_error_moves_to_error_state() {
    let mut script = Script::frames(100, 50.0);
    script.fail_at = Some(3);
    let mut h = Harness::new(script, false);
    h.player.open_and_play("broken.mov").expect("open should succeed");

    let events = h.wait_for(|e| matches!(e, PlaybackEvent::Error(_))).await;
    let Some(PlaybackEvent::Error(err)) = events.last() else {
        panic!("expected an error event");
    };
    assert!(err.is_decode_failure());
    assert_eq!(h.player.state(), SessionState::Error);
    assert_eq!(h.counters.open_handles(), 0);
    assert_eq!(h.presented().len(), 3);

    // No automatic recovery, but a fresh open is accepted.
    h.player.open_and_play("broken.mov").expect("reopen should succeed");
    assert_eq!(h.player.state(), SessionState::Playing);
}

#[tokio::test]
async fn open_failure_is_reported_and_leaves_no_handle() {
    let mut script = Script::frames(10, 30.0);
    script.open_error = Some(VideoError::DecoderUnavailable("notchlc".to_string()));
    let mut h = Harness::new(script, false);

    let result = h.player.open_and_play("clip.mov");
    assert!(matches!(
        result,
        Err(Error::Video(VideoError::DecoderUnavailable(_)))
    ));
    assert!(matches!(h.next_event().await, PlaybackEvent::Error(_)));
    assert_eq!(h.player.state(), SessionState::Error);
    assert_eq!(h.counters.open_handles(), 0);
}

#[tokio::test]
async fn early_frame_is_held_without_further_pulls() {
    let mut script = Script::frames(100, 50.0);
    script.first_pts = 60.0;
    let h = Harness::new(script, false);
    h.player.open_and_play("late_start.mov").expect("open should succeed");

    std::thread::sleep(Duration::from_millis(200));

    assert_eq!(h.counters.pulls.load(Ordering::SeqCst), 1);
    assert!(h.presented().is_empty());
}

#[tokio::test]
async fn resume_offset_starts_the_clock_there() {
    let h = Harness::new(Script::frames(10_000, 50.0), false);
    h.player
        .open_and_play_from("clip.mov", 30.0)
        .expect("open should succeed");

    let position = h.player.clock().position();
    assert!((30.0..31.0).contains(&position), "position {position}");
}

#[test]
fn dropping_the_player_closes_the_handle() {
    let h = Harness::new(Script::frames(10_000, 50.0), false);
    h.player.open_and_play("clip.mov").expect("open should succeed");
    let counters = Arc::clone(&h.counters);

    drop(h);

    assert_eq!(counters.open_handles(), 0);
}

#[test]
fn playback_runs_with_nobody_listening() {
    let mut h = Harness::new(Script::frames(3, 50.0), false);
    drop(std::mem::replace(
        &mut h.events,
        tokio::sync::mpsc::unbounded_channel().1,
    ));
    assert!(h.player.take_events().is_none());
    h.player.open_and_play("clip.mov").expect("open should succeed");
    h.player.stop().expect("stop should succeed");
}
