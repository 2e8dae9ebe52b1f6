// SPDX-License-Identifier: MPL-2.0
//! Codec gate: decides whether a file may be played at all.
//!
//! Exactly one codec identity is allowed: the canonical codec name
//! `notchlc`, or the container tag `nclc`. Everything else, including a
//! file without any video stream, is rejected without an error.

use crate::domain::error::VideoError;
use crate::media::video::{codec_identity, open_input};
use std::path::Path;
use tracing::debug;

/// Canonical `FFmpeg` codec name of the allowed codec.
pub const ALLOWED_CODEC_NAME: &str = "notchlc";

/// Container tag of the allowed codec, in file byte order.
pub const ALLOWED_FOURCC: [u8; 4] = *b"nclc";

/// Returns true if the codec identity matches the allowed codec.
///
/// `tag` is the 32-bit container tag as stored by the demuxer; its
/// little-endian bytes spell the four characters.
///
/// # Example
///
/// ```
/// use notchlc_player::media::is_allowed_codec;
///
/// assert!(is_allowed_codec("notchlc", 0));
/// assert!(is_allowed_codec("none", u32::from_le_bytes(*b"nclc")));
/// assert!(!is_allowed_codec("h264", u32::from_le_bytes(*b"avc1")));
/// ```
#[must_use]
pub fn is_allowed_codec(name: &str, tag: u32) -> bool {
    name == ALLOWED_CODEC_NAME || tag.to_le_bytes() == ALLOWED_FOURCC
}

/// Renders a container tag as four characters.
///
/// Non-printable bytes are shown as `.`; a zero tag renders as an empty string.
#[must_use]
pub fn fourcc_to_string(tag: u32) -> String {
    if tag == 0 {
        return String::new();
    }
    tag.to_le_bytes()
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                char::from(b)
            } else {
                '.'
            }
        })
        .collect()
}

/// Inspects the file's best video stream and reports whether it may be played.
///
/// Opens the container read-only and closes it before returning.
///
/// # Errors
///
/// Returns a [`VideoError`] only if the container cannot be opened or probed.
pub fn accepts(path: &Path) -> Result<bool, VideoError> {
    let input = open_input(path)?;
    let Some(stream) = input.streams().best(ffmpeg_next::media::Type::Video) else {
        debug!(path = %path.display(), "no video stream, rejecting");
        return Ok(false);
    };

    let (name, tag) = codec_identity(&stream);
    let allowed = is_allowed_codec(&name, tag);
    debug!(
        path = %path.display(),
        codec = %name,
        tag = %fourcc_to_string(tag),
        allowed,
        "codec gate"
    );
    Ok(allowed)
}
