// SPDX-License-Identifier: MPL-2.0
//! Clock-driven frame pacing.
//!
//! The pacer decides, once per tick, whether to present, hold or pull.
//! It keeps at most one decoded frame back (the *pending* frame): a frame
//! pulled too early is held until the clock reaches it, and nothing new is
//! pulled while one is held.
//!
//! # Decision rules
//!
//! - A held frame is due when `pts <= position + DUE_EPSILON_SECS`.
//! - A freshly pulled frame is held when `pts - position > lookahead`,
//!   otherwise presented at once. Late frames are never dropped.
//! - A frame with unknown timestamp is presented at once.

use crate::application::port::FrameSource;
use crate::config::defaults::DUE_EPSILON_SECS;
use crate::domain::error::VideoError;
use crate::domain::media::{DecodedFrame, FramePull};
use crate::domain::video::{FrameInterval, Seconds};

/// What to do with a freshly pulled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingAction {
    /// Hand the frame to the sink now.
    Present,
    /// Keep the frame until the clock catches up.
    Hold,
}

/// Result of one pacing step.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// One frame went to the sink.
    Presented,
    /// A frame is pending and not yet due.
    Holding,
    /// The source is exhausted.
    EndOfStream,
    /// The source reported a hard error.
    Failed(VideoError),
}

/// Returns true if a held frame with timestamp `pts` should be shown at
/// clock `position`.
#[must_use]
pub fn is_due(pts: Seconds, position: f64) -> bool {
    match pts.get() {
        Some(pts) => pts <= position + DUE_EPSILON_SECS,
        None => true,
    }
}

/// Classifies a freshly pulled frame.
#[must_use]
pub fn classify_pulled(pts: Seconds, position: f64, lookahead_secs: f64) -> PacingAction {
    match pts.get() {
        Some(pts) if pts - position > lookahead_secs => PacingAction::Hold,
        _ => PacingAction::Present,
    }
}

/// Per-session pacing state: the lookahead budget and the pending frame.
#[derive(Debug)]
pub struct Pacer {
    pending: Option<DecodedFrame>,
    lookahead_secs: f64,
}

impl Pacer {
    #[must_use]
    pub fn new(interval: FrameInterval) -> Self {
        Self {
            pending: None,
            lookahead_secs: interval.lookahead_secs(),
        }
    }

    /// Runs one tick at clock `position`.
    ///
    /// Presents at most one frame through `present`, and pulls at most one
    /// frame from `source`.
    pub fn step(
        &mut self,
        position: f64,
        source: &mut dyn FrameSource,
        present: &mut dyn FnMut(DecodedFrame),
    ) -> TickOutcome {
        if let Some(frame) = self.pending.take() {
            if is_due(frame.pts(), position) {
                present(frame);
                return TickOutcome::Presented;
            }
            self.pending = Some(frame);
            return TickOutcome::Holding;
        }

        match source.next_frame() {
            Ok(FramePull::Frame(frame)) => {
                match classify_pulled(frame.pts(), position, self.lookahead_secs) {
                    PacingAction::Present => {
                        present(frame);
                        TickOutcome::Presented
                    }
                    PacingAction::Hold => {
                        self.pending = Some(frame);
                        TickOutcome::Holding
                    }
                }
            }
            Ok(FramePull::EndOfStream) => TickOutcome::EndOfStream,
            Err(err) => TickOutcome::Failed(err),
        }
    }

    /// Returns true if a frame is being held back.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Timestamp of the held frame, if any.
    #[must_use]
    pub fn pending_pts(&self) -> Option<Seconds> {
        self.pending.as_ref().map(DecodedFrame::pts)
    }

    /// Drops the held frame.
    pub fn clear(&mut self) {
        self.pending = None;
    }
}
