// SPDX-License-Identifier: MPL-2.0
//! `FFmpeg` helpers shared by the codec gate, the duration probes and the
//! decode engine, plus the one-pass [`probe`] summary.

use crate::domain::error::VideoError;
use crate::domain::video::Seconds;
use crate::media::{codec_gate, duration};
use ffmpeg_next::format::context::Input;
use ffmpeg_next::format::stream::Stream;
use std::ffi::CStr;
use std::fmt;
use std::path::Path;
use std::sync::Once;

/// Static flag to ensure FFmpeg is initialized only once.
static FFMPEG_INIT: Once = Once::new();

/// Initialize FFmpeg with appropriate log level.
///
/// This function is safe to call multiple times - initialization will only
/// happen once thanks to `std::sync::Once`. It sets the FFmpeg log level
/// to ERROR so probing odd containers does not spam stderr.
///
/// # Errors
///
/// Returns [`VideoError::Other`] if the libraries fail to initialize.
pub fn init_ffmpeg() -> Result<(), VideoError> {
    let mut init_result = Ok(());

    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg_next::init() {
            init_result = Err(VideoError::Other(format!(
                "FFmpeg initialization failed: {e}"
            )));
            return;
        }

        // SAFETY: av_log_set_level is thread-safe and only affects logging
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
        }
    });

    init_result
}

/// Opens a container read-only and probes its stream info.
pub(crate) fn open_input(path: &Path) -> Result<Input, VideoError> {
    init_ffmpeg()?;
    ffmpeg_next::format::input(&path)
        .map_err(|e| VideoError::Io(format!("{}: {e}", path.display())))
}

/// Returns the canonical codec name and the raw container tag of a stream.
pub(crate) fn codec_identity(stream: &Stream<'_>) -> (String, u32) {
    let params = stream.parameters();
    // SAFETY: `params` wraps the stream's codec parameters, which stay valid
    // while the stream (and thus the input) is borrowed.
    let (codec_id, codec_tag) = unsafe {
        let raw = params.as_ptr();
        ((*raw).codec_id, (*raw).codec_tag)
    };

    // SAFETY: avcodec_get_name returns a static, NUL-terminated string for any id.
    let name = unsafe {
        let ptr = ffmpeg_next::ffi::avcodec_get_name(codec_id);
        if ptr.is_null() {
            String::new()
        } else {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    };

    (name, codec_tag)
}

/// One-pass summary of a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProbe {
    /// Canonical codec name of the best video stream.
    pub codec_name: String,
    /// Container tag of the best video stream, rendered as text.
    pub fourcc: String,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Average frame rate, if declared.
    pub frame_rate: Option<f64>,
    /// Container-level duration.
    pub format_duration: Seconds,
    /// Cheap cascade estimate.
    pub estimated_duration: Seconds,
    /// Frame count over frame rate.
    pub frame_accurate_duration: Seconds,
    /// Last packet timestamp near the end of the stream.
    pub precise_duration: Seconds,
    /// Codec gate verdict.
    pub accepted: bool,
}

impl fmt::Display for MediaProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "codec:            {} ({})", self.codec_name, self.fourcc)?;
        writeln!(f, "dimensions:       {}x{}", self.width, self.height)?;
        match self.frame_rate {
            Some(fps) => writeln!(f, "frame rate:       {fps:.3} fps")?,
            None => writeln!(f, "frame rate:       unknown")?,
        }
        writeln!(f, "format duration:  {}", self.format_duration)?;
        writeln!(f, "estimated:        {}", self.estimated_duration)?;
        writeln!(f, "frame accurate:   {}", self.frame_accurate_duration)?;
        writeln!(f, "precise:          {}", self.precise_duration)?;
        write!(
            f,
            "playable:         {}",
            if self.accepted { "yes" } else { "no" }
        )
    }
}

/// Probes a file in one pass for the CLI `probe` command.
///
/// # Errors
///
/// Returns a [`VideoError`] if the container cannot be opened or has no
/// video stream.
pub fn probe(path: &Path) -> Result<MediaProbe, VideoError> {
    let input = open_input(path)?;
    let stream = input
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or(VideoError::NoVideoStream)?;

    let (codec_name, tag) = codec_identity(&stream);
    let params = stream.parameters();
    // SAFETY: see `codec_identity`.
    let (width, height) = unsafe {
        let raw = params.as_ptr();
        ((*raw).width, (*raw).height)
    };

    let metadata = duration::DurationProbe::from_input(&input, path);

    Ok(MediaProbe {
        accepted: codec_gate::is_allowed_codec(&codec_name, tag),
        fourcc: codec_gate::fourcc_to_string(tag),
        codec_name,
        width: u32::try_from(width).unwrap_or(0),
        height: u32::try_from(height).unwrap_or(0),
        frame_rate: metadata.frame_rate(),
        format_duration: metadata.container_seconds(),
        estimated_duration: metadata.estimate(),
        frame_accurate_duration: metadata.frame_accurate(),
        precise_duration: duration::precise_estimate(path),
    })
}
