// SPDX-License-Identifier: MPL-2.0
//! The decode worker.
//!
//! A single thread owns the media handle. It runs jobs one at a time in
//! submission order and, between jobs, the pacing tick. The tick is a
//! `crossbeam_channel::tick` receiver while a session runs and
//! `crossbeam_channel::never()` otherwise.

use super::pacing::{Pacer, TickOutcome};
use super::presenter::PresenterHandle;
use super::properties::SharedProperties;
use super::state::{OpenOutcome, PlaybackEvent, SessionInfo};
use crate::application::port::{FrameSource, MediaBackend, SharedClock};
use crate::domain::error::VideoError;
use crate::domain::video::{FrameInterval, Seconds, SessionState};
use crossbeam_channel::{never, select, tick, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// Work submitted by the player facade.
pub(crate) enum Job {
    Open {
        path: PathBuf,
        resume_offset: f64,
        reply: Sender<Result<OpenOutcome, VideoError>>,
    },
    Stop {
        reply: Sender<()>,
    },
    Shutdown {
        reply: Sender<()>,
    },
}

struct Session {
    path: PathBuf,
    source: Box<dyn FrameSource>,
    pacer: Pacer,
}

/// Everything the worker thread touches.
pub(crate) struct Worker {
    pub(crate) backend: Box<dyn MediaBackend>,
    pub(crate) clock: SharedClock,
    pub(crate) presenter: PresenterHandle,
    pub(crate) properties: Arc<SharedProperties>,
    pub(crate) loop_enabled: Arc<AtomicBool>,
    pub(crate) events: UnboundedSender<PlaybackEvent>,
    pub(crate) default_frame_rate: f64,
}

struct WorkerState {
    shared: Worker,
    session: Option<Session>,
    ticker: Receiver<Instant>,
    shutting_down: bool,
}

impl Worker {
    /// Runs the job/tick loop until shutdown or until every job sender is gone.
    pub(crate) fn run(self, jobs: &Receiver<Job>) {
        let mut state = WorkerState {
            shared: self,
            session: None,
            ticker: never(),
            shutting_down: false,
        };

        loop {
            let ticker = state.ticker.clone();
            select! {
                recv(jobs) -> job => match job {
                    Ok(Job::Open { path, resume_offset, reply }) => {
                        let outcome = state.open(path, resume_offset);
                        let _ = reply.send(outcome);
                    }
                    Ok(Job::Stop { reply }) => {
                        state.teardown();
                        let _ = reply.send(());
                    }
                    Ok(Job::Shutdown { reply }) => {
                        state.teardown();
                        let _ = reply.send(());
                        break;
                    }
                    Err(_) => {
                        state.teardown();
                        break;
                    }
                },
                recv(ticker) -> _ => state.on_tick(),
            }
        }
        tracing::debug!("decode worker exiting");
    }
}

impl WorkerState {
    fn emit(&self, event: PlaybackEvent) {
        // Nobody listening is fine.
        let _ = self.shared.events.send(event);
    }

    fn open(&mut self, path: PathBuf, resume_offset: f64) -> Result<OpenOutcome, VideoError> {
        self.disarm();
        self.close_session();
        self.shared.presenter.flush();
        self.shared.clock.set_rate(0.0);

        let props = &self.shared.properties;
        props.set_state(SessionState::Opening);
        props.set_duration(Seconds::UNKNOWN);
        props.set_frame_rate(None);
        tracing::debug!(path = %path.display(), "opening");

        match self.shared.backend.accepts(&path) {
            Ok(true) => {}
            Ok(false) => {
                let display_name = display_name(&path);
                tracing::info!(file = %display_name, "not a NotchLC video, rejected");
                self.shared.properties.set_position(0.0);
                self.shared.properties.set_state(SessionState::Idle);
                self.emit(PlaybackEvent::Rejected {
                    display_name: display_name.clone(),
                });
                return Ok(OpenOutcome::Rejected { display_name });
            }
            Err(err) => {
                self.fail(err.clone());
                return Err(err);
            }
        }

        let offset = if resume_offset.is_finite() {
            resume_offset.max(0.0)
        } else {
            0.0
        };

        match self.start_session(path, offset, Seconds::UNKNOWN, true) {
            Ok(info) => {
                self.emit(PlaybackEvent::Opened(info.clone()));
                Ok(OpenOutcome::Playing(info))
            }
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Opens the decoder and arms the tick.
    ///
    /// With `restart_clock` the clock runs at rate 1 afterwards; otherwise
    /// the current rate is kept.
    fn start_session(
        &mut self,
        path: PathBuf,
        offset: f64,
        measured: Seconds,
        restart_clock: bool,
    ) -> Result<SessionInfo, VideoError> {
        let source = self.shared.backend.open(&path)?;
        let stream = source.stream_info().clone();

        let backend = &self.shared.backend;
        let duration = measured
            .or_else(|| backend.estimate_duration(&path))
            .or(stream.declared_duration);
        let interval = FrameInterval::with_fallback(stream.frame_rate, self.shared.default_frame_rate);

        let clock = &self.shared.clock;
        clock.set_position(offset);
        if restart_clock {
            clock.set_rate(1.0);
        }
        let state = if clock.is_running() {
            SessionState::Playing
        } else {
            SessionState::Paused
        };

        let props = &self.shared.properties;
        props.set_position(offset);
        props.set_duration(duration);
        props.set_frame_rate(stream.frame_rate);
        props.set_state(state);

        tracing::info!(
            path = %path.display(),
            width = stream.width,
            height = stream.height,
            %duration,
            interval_ms = interval.as_secs_f64() * 1000.0,
            "session started"
        );

        self.ticker = tick(interval.as_duration());
        self.session = Some(Session {
            path: path.clone(),
            source,
            pacer: Pacer::new(interval),
        });

        Ok(SessionInfo {
            path,
            stream,
            duration,
            interval,
        })
    }

    fn on_tick(&mut self) {
        if self.shutting_down {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let clock = &self.shared.clock;
        let position = clock.position();
        self.shared.properties.set_position(position);
        if !clock.is_running() {
            return;
        }

        let presenter = &self.shared.presenter;
        let outcome = session
            .pacer
            .step(position, session.source.as_mut(), &mut |frame| {
                presenter.present(frame);
            });

        match outcome {
            TickOutcome::Presented | TickOutcome::Holding => {}
            TickOutcome::EndOfStream => self.on_end_of_stream(position),
            TickOutcome::Failed(err) => self.fail(err),
        }
    }

    fn on_end_of_stream(&mut self, position: f64) {
        self.shared.properties.set_state(SessionState::Draining);

        let measured = Seconds::positive(position);
        if let Some(seconds) = measured.get() {
            self.shared.properties.set_duration(measured);
            self.emit(PlaybackEvent::DurationMeasured { seconds });
        }
        tracing::debug!(%measured, "end of stream");

        let Some(path) = self.session.as_ref().map(|s| s.path.clone()) else {
            return;
        };

        if self.shared.loop_enabled.load(Ordering::Acquire) {
            self.close_session();
            self.shared.clock.set_position(0.0);
            match self.start_session(path, 0.0, measured, false) {
                Ok(_) => self.emit(PlaybackEvent::Looped),
                Err(err) => self.fail(err),
            }
        } else {
            self.disarm();
            self.close_session();
            self.shared.clock.set_rate(0.0);
            self.shared.properties.set_state(SessionState::Stopped);
            tracing::info!(path = %path.display(), "playback ended");
            self.emit(PlaybackEvent::Ended);
        }
    }

    fn fail(&mut self, err: VideoError) {
        tracing::error!(%err, "playback failed");
        self.disarm();
        self.close_session();
        self.shared.presenter.flush();
        self.shared.clock.set_rate(0.0);
        self.shared.properties.set_state(SessionState::Error);
        self.emit(PlaybackEvent::Error(err));
    }

    /// Synchronous stop. A no-op when nothing is open.
    fn teardown(&mut self) {
        self.shutting_down = true;
        self.disarm();

        let had_session = self.session.is_some();
        self.close_session();

        if had_session {
            let clock = &self.shared.clock;
            // set_rate re-anchors at the running position, so it goes first.
            clock.set_rate(0.0);
            clock.set_position(0.0);
            self.shared.presenter.flush();
            self.shared.properties.set_position(0.0);
            self.shared.properties.set_state(SessionState::Stopped);
            tracing::info!("playback stopped");
            self.emit(PlaybackEvent::Stopped);
        }

        self.shutting_down = false;
    }

    fn disarm(&mut self) {
        self.ticker = never();
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.pacer.clear();
            session.source.close();
            tracing::debug!(path = %session.path.display(), "media handle closed");
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}
