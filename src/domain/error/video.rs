// SPDX-License-Identifier: MPL-2.0
//! Errors raised while opening or decoding a video.

use std::fmt;

/// Specific error types for video open and decode failures.
///
/// A codec rejection is deliberately *not* represented here: the codec gate
/// answers `false` for foreign codecs and the player reports that as a
/// rejection outcome rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoError {
    /// The container could not be opened or its stream info probed.
    Io(String),

    /// File exists but contains no video stream.
    NoVideoStream,

    /// No decoder is available for the stream's codec.
    DecoderUnavailable(String),

    /// The decoder reported zero width or height.
    InvalidDimensions { width: u32, height: u32 },

    /// A hard error from the demux, decode or pixel conversion step.
    DecodingFailed(String),

    /// Generic error with raw message.
    Other(String),
}

impl VideoError {
    /// Returns true if this error happened while a session was already running.
    ///
    /// Everything else is an open failure.
    #[must_use]
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, VideoError::DecodingFailed(_))
    }
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::Io(msg) => write!(f, "Cannot open media: {msg}"),
            VideoError::NoVideoStream => write!(f, "No video stream found"),
            VideoError::DecoderUnavailable(codec) => {
                write!(f, "No decoder available for codec: {codec}")
            }
            VideoError::InvalidDimensions { width, height } => {
                write!(f, "Invalid video dimensions: {width}x{height}")
            }
            VideoError::DecodingFailed(msg) => write!(f, "Decoding failed: {msg}"),
            VideoError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for VideoError {}
