// SPDX-License-Identifier: MPL-2.0
//! Video playback engine.
//!
//! Pulls decoded NotchLC frames on a dedicated worker and hands them to a
//! presentation sink when a shared clock reaches their timestamps.
//!
//! # Architecture
//!
//! ```text
//! caller ──jobs──▶ decode worker ──frames──▶ presentation thread ──▶ sink
//!    │                 │  ▲                          │
//!    └─ pause/resume ──┴──┴──── PlaybackClock ◀──────┘
//! ```
//!
//! - [`VideoPlayer`] submits open/stop jobs and toggles the clock
//! - The worker owns the media handle and runs the pacing tick
//! - [`SyncClock`] is the reference clock
//! - [`HeadlessSink`] paces to the clock without a display

mod pacing;
mod presenter;
mod properties;
pub mod sink;
mod state;
pub mod sync;
pub mod time_units;
mod worker;

pub use pacing::{classify_pulled, is_due, Pacer, PacingAction, TickOutcome};
pub use properties::SessionProperties;
pub use sink::{HeadlessSink, SinkMonitor};
pub use state::{OpenOutcome, PlaybackEvent, PlayerOptions, SessionInfo, VideoPlayer};
pub use sync::{create_sync_clock, SyncClock};
pub use time_units::format_duration_label;
