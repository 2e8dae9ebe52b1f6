// SPDX-License-Identifier: MPL-2.0
//! Player facade.
//!
//! [`VideoPlayer`] is what callers hold. It owns two threads:
//!
//! - the decode worker, which owns the media handle and runs the tick
//! - the presentation thread, which owns the sink
//!
//! Open, stop and shutdown are jobs on the worker and block until it has
//! answered. Pause and resume touch only the clock and the session state,
//! directly from the caller's thread.

use super::presenter::Presenter;
use super::properties::{SessionProperties, SharedProperties};
use super::sync::create_sync_clock;
use super::worker::{Job, Worker};
use crate::application::port::{MediaBackend, PresentationSink, SharedClock};
use crate::config::defaults;
use crate::domain::error::VideoError;
use crate::domain::media::StreamInfo;
use crate::domain::video::{FrameInterval, Seconds, SessionState};
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, unbounded, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Options fixed for the lifetime of a player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerOptions {
    /// Restart from the beginning at end of stream.
    pub loop_playback: bool,
    /// Tick rate used when a stream declares no frame rate.
    pub default_frame_rate: f64,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            loop_playback: defaults::DEFAULT_LOOP_PLAYBACK,
            default_frame_rate: defaults::DEFAULT_FRAME_RATE,
        }
    }
}

/// What a successful open produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub path: PathBuf,
    pub stream: StreamInfo,
    /// Initial duration; may be revised by [`PlaybackEvent::DurationMeasured`].
    pub duration: Seconds,
    pub interval: FrameInterval,
}

/// Result of [`VideoPlayer::open_and_play`].
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    /// The file passed the codec gate and is playing.
    Playing(SessionInfo),
    /// The file is not a NotchLC video. No session was created.
    Rejected { display_name: String },
}

impl OpenOutcome {
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Notifications from the worker, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Opened(SessionInfo),
    Rejected { display_name: String },
    /// End of stream reached; the clock position there is the real duration.
    DurationMeasured { seconds: f64 },
    Looped,
    Ended,
    Stopped,
    Error(VideoError),
}

/// A NotchLC playback session controller.
///
/// # Example
///
/// ```no_run
/// use notchlc_player::infrastructure::FfmpegBackend;
/// use notchlc_player::video_player::{HeadlessSink, PlayerOptions, VideoPlayer};
///
/// let (sink, _monitor) = HeadlessSink::new(false);
/// let player = VideoPlayer::spawn(FfmpegBackend::new(), sink, PlayerOptions::default())?;
/// let outcome = player.open_and_play("clip.mov")?;
/// println!("{outcome:?}");
/// player.stop()?;
/// # Ok::<(), notchlc_player::error::Error>(())
/// ```
pub struct VideoPlayer {
    jobs: Option<Sender<Job>>,
    clock: SharedClock,
    properties: Arc<SharedProperties>,
    loop_enabled: Arc<AtomicBool>,
    events: Option<UnboundedReceiver<PlaybackEvent>>,
    worker: Option<JoinHandle<()>>,
    presenter: Presenter,
}

impl VideoPlayer {
    /// Starts a player with its own [`SyncClock`](super::SyncClock).
    ///
    /// # Errors
    ///
    /// Returns an error if a thread cannot be spawned.
    pub fn spawn<B, S>(backend: B, sink: S, options: PlayerOptions) -> Result<Self>
    where
        B: MediaBackend,
        S: PresentationSink,
    {
        Self::spawn_with_clock(backend, sink, create_sync_clock(), options)
    }

    /// Starts a player driven by `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if a thread cannot be spawned.
    pub fn spawn_with_clock<B, S>(
        backend: B,
        sink: S,
        clock: SharedClock,
        options: PlayerOptions,
    ) -> Result<Self>
    where
        B: MediaBackend,
        S: PresentationSink,
    {
        let presenter = Presenter::spawn(sink, Arc::clone(&clock))?;
        let properties = Arc::new(SharedProperties::default());
        let loop_enabled = Arc::new(AtomicBool::new(options.loop_playback));
        let (events_tx, events_rx) = unbounded_channel();
        let (jobs_tx, jobs_rx) = unbounded::<Job>();

        let worker = Worker {
            backend: Box::new(backend),
            clock: Arc::clone(&clock),
            presenter: presenter.handle(),
            properties: Arc::clone(&properties),
            loop_enabled: Arc::clone(&loop_enabled),
            events: events_tx,
            default_frame_rate: options.default_frame_rate,
        };
        let worker = thread::Builder::new()
            .name("notchlc-decode".to_string())
            .spawn(move || worker.run(&jobs_rx))?;

        Ok(Self {
            jobs: Some(jobs_tx),
            clock,
            properties,
            loop_enabled,
            events: Some(events_rx),
            worker: Some(worker),
            presenter,
        })
    }

    /// Takes the event receiver. Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<UnboundedReceiver<PlaybackEvent>> {
        self.events.take()
    }

    /// Gates, opens and starts playing `path` from the beginning.
    ///
    /// Any session already running is closed first. A file with a foreign
    /// codec yields [`OpenOutcome::Rejected`], not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Video`] if the file cannot be opened, or
    /// [`Error::WorkerUnavailable`] if the worker has exited.
    pub fn open_and_play(&self, path: impl AsRef<Path>) -> Result<OpenOutcome> {
        self.open_and_play_from(path, 0.0)
    }

    /// Like [`open_and_play`](Self::open_and_play), with the clock starting
    /// at `resume_offset` seconds.
    ///
    /// Frames are not skipped: those before the offset are shown one per
    /// tick until the stream catches up with the clock.
    ///
    /// # Errors
    ///
    /// Same as [`open_and_play`](Self::open_and_play).
    pub fn open_and_play_from(
        &self,
        path: impl AsRef<Path>,
        resume_offset: f64,
    ) -> Result<OpenOutcome> {
        let (reply, answer) = bounded(1);
        self.submit(Job::Open {
            path: path.as_ref().to_path_buf(),
            resume_offset,
            reply,
        })?;
        let outcome = answer.recv().map_err(|_| Error::WorkerUnavailable)?;
        Ok(outcome?)
    }

    /// Pauses the clock. Returns false if not playing.
    pub fn pause(&self) -> bool {
        self.properties.update_state(|state| {
            state.is_playing().then(|| {
                self.clock.set_rate(0.0);
                SessionState::Paused
            })
        })
    }

    /// Resumes the clock. Returns false if not paused.
    pub fn resume(&self) -> bool {
        self.properties.update_state(|state| {
            state.is_paused().then(|| {
                self.clock.set_rate(1.0);
                SessionState::Playing
            })
        })
    }

    /// Flips between playing and paused. Returns false in any other state.
    pub fn toggle_pause(&self) -> bool {
        self.properties.update_state(|state| match state {
            SessionState::Playing => {
                self.clock.set_rate(0.0);
                Some(SessionState::Paused)
            }
            SessionState::Paused => {
                self.clock.set_rate(1.0);
                Some(SessionState::Playing)
            }
            _ => None,
        })
    }

    /// Stops playback and waits until the media handle is closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] if the worker has exited.
    pub fn stop(&self) -> Result<()> {
        let (reply, answer) = bounded(1);
        self.submit(Job::Stop { reply })?;
        answer.recv().map_err(|_| Error::WorkerUnavailable)
    }

    /// Enables or disables looping. Takes effect at the next end of stream.
    pub fn set_loop(&self, enabled: bool) {
        self.loop_enabled.store(enabled, Ordering::Release);
    }

    #[must_use]
    pub fn is_loop_enabled(&self) -> bool {
        self.loop_enabled.load(Ordering::Acquire)
    }

    /// Snapshot of position, duration, frame rate and state.
    #[must_use]
    pub fn properties(&self) -> SessionProperties {
        self.properties.snapshot()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.properties.state()
    }

    /// The clock driving this player.
    #[must_use]
    pub fn clock(&self) -> SharedClock {
        Arc::clone(&self.clock)
    }

    fn submit(&self, job: Job) -> Result<()> {
        self.jobs
            .as_ref()
            .ok_or(Error::WorkerUnavailable)?
            .send(job)
            .map_err(|_| Error::WorkerUnavailable)
    }

    fn shutdown(&mut self) {
        if let Some(jobs) = self.jobs.take() {
            let (reply, answer) = bounded(1);
            if jobs.send(Job::Shutdown { reply }).is_ok() {
                let _ = answer.recv();
            }
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.presenter.shutdown();
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
