// SPDX-License-Identifier: MPL-2.0
//! Presentation thread.
//!
//! Owns the [`PresentationSink`] and feeds it from a bounded queue, so a
//! sink that sleeps until each frame's display instant never stalls the
//! decode worker.
//!
//! Every flush bumps an epoch. Frames queued before the flush carry the old
//! epoch and are discarded unseen.

use crate::application::port::{PresentationSink, SharedClock};
use crate::config::defaults::PRESENT_QUEUE_DEPTH;
use crate::domain::media::DecodedFrame;
use crate::domain::video::Seconds;
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

enum PresentJob {
    Display {
        frame: DecodedFrame,
        pts: Seconds,
        epoch: u64,
    },
    Flush,
    Shutdown,
}

/// Fire-and-forget handle to the presentation thread.
#[derive(Clone)]
pub(crate) struct PresenterHandle {
    jobs: Sender<PresentJob>,
    epoch: Arc<AtomicU64>,
}

impl PresenterHandle {
    /// Queues a frame. Drops it if the sink is too far behind.
    pub(crate) fn present(&self, frame: DecodedFrame) {
        let pts = frame.pts();
        let epoch = self.epoch.load(Ordering::Acquire);
        match self.jobs.try_send(PresentJob::Display { frame, pts, epoch }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::debug!(%pts, "presentation queue full, frame dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("presentation thread is gone");
            }
        }
    }

    /// Discards queued frames and asks the sink to clear its content.
    pub(crate) fn flush(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let _ = self.jobs.send(PresentJob::Flush);
    }
}

/// The presentation thread itself. Joined on [`Presenter::shutdown`] or drop.
pub(crate) struct Presenter {
    handle: PresenterHandle,
    thread_handle: Option<JoinHandle<()>>,
}

impl Presenter {
    /// Starts the thread that drives `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub(crate) fn spawn<S: PresentationSink>(sink: S, clock: SharedClock) -> Result<Self> {
        let (jobs_tx, jobs_rx) = bounded::<PresentJob>(PRESENT_QUEUE_DEPTH);
        let epoch = Arc::new(AtomicU64::new(0));
        let loop_epoch = Arc::clone(&epoch);

        let thread_handle = thread::Builder::new()
            .name("notchlc-present".to_string())
            .spawn(move || Self::present_loop(sink, &clock, &jobs_rx, &loop_epoch))
            .map_err(Error::from)?;

        Ok(Self {
            handle: PresenterHandle {
                jobs: jobs_tx,
                epoch,
            },
            thread_handle: Some(thread_handle),
        })
    }

    pub(crate) fn handle(&self) -> PresenterHandle {
        self.handle.clone()
    }

    /// Stops the thread after it finishes the frame in hand.
    pub(crate) fn shutdown(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            self.handle.epoch.fetch_add(1, Ordering::AcqRel);
            let _ = self.handle.jobs.send(PresentJob::Shutdown);
            let _ = handle.join();
        }
    }

    fn present_loop<S: PresentationSink>(
        mut sink: S,
        clock: &SharedClock,
        jobs: &Receiver<PresentJob>,
        epoch: &AtomicU64,
    ) {
        while let Ok(job) = jobs.recv() {
            match job {
                PresentJob::Display {
                    frame,
                    pts,
                    epoch: frame_epoch,
                } => {
                    if frame_epoch != epoch.load(Ordering::Acquire) {
                        tracing::trace!(%pts, "stale frame discarded");
                        continue;
                    }
                    sink.present(frame, pts, clock.as_ref());
                }
                PresentJob::Flush => sink.flush(),
                PresentJob::Shutdown => break,
            }
        }
        tracing::debug!("presentation thread exiting");
    }
}

impl Drop for Presenter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
