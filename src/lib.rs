// SPDX-License-Identifier: MPL-2.0
//! `notchlc_player` plays NotchLC video with frame-accurate pacing.
//!
//! Files are gated on their codec before any decoder is opened. Frames are
//! decoded on a dedicated worker and presented when a shared playback clock
//! reaches their timestamps, with pause, loop and stop handled by a small
//! session state machine.

#![doc(html_root_url = "https://docs.rs/notchlc_player/0.1.0")]

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod media;
pub mod video_player;

#[cfg(test)]
pub(crate) mod test_utils;
