// SPDX-License-Identifier: MPL-2.0
//! Test utilities for float comparisons and other common test helpers.
//!
//! This module re-exports the `approx` crate's assertion macros for float comparison,
//! which properly handle floating-point precision issues that `assert_eq!` cannot,
//! and writes small synthetic clips so the `FFmpeg` paths run without sample files.

// Re-export approx macros for convenient use in tests
pub use approx::{assert_abs_diff_eq, assert_relative_eq};

/// Default epsilon for f64 comparisons.
/// Suitable for timestamps that should be "exactly equal" but may have minor floating-point errors.
pub const F64_EPSILON: f64 = 1e-10;

/// Width of clips written by [`generate_clip`].
pub const TEST_CLIP_WIDTH: u32 = 64;

/// Height of clips written by [`generate_clip`].
pub const TEST_CLIP_HEIGHT: u32 = 48;

/// A short MPEG-4 clip in a temporary directory, deleted on drop.
pub struct TestClip {
    _dir: tempfile::TempDir,
    pub path: std::path::PathBuf,
    pub frames: i64,
    pub fps: i32,
}

impl TestClip {
    pub fn frame_interval(&self) -> f64 {
        1.0 / f64::from(self.fps)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn nominal_duration(&self) -> f64 {
        self.frames as f64 / f64::from(self.fps)
    }
}

/// Encodes `frames` flat pictures at `fps` into a Matroska file.
///
/// Returns `None` (and says why) when the local `FFmpeg` build cannot write
/// it, so callers can skip the same way they skip missing sample files.
pub fn generate_clip(frames: i64, fps: i32) -> Option<TestClip> {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("Skipping test: no temporary directory: {err}");
            return None;
        }
    };
    let path = dir.path().join("clip.mkv");
    match encode_clip(&path, frames, fps) {
        Ok(()) => Some(TestClip {
            _dir: dir,
            path,
            frames,
            fps,
        }),
        Err(err) => {
            eprintln!("Skipping test: cannot encode test clip: {err}");
            None
        }
    }
}

fn encode_clip(
    path: &std::path::Path,
    frames: i64,
    fps: i32,
) -> Result<(), crate::domain::error::VideoError> {
    use crate::domain::error::VideoError;
    use ffmpeg_next::{codec, encoder, format, frame, Rational};

    let ff = |e: ffmpeg_next::Error| VideoError::Other(e.to_string());

    crate::media::video::init_ffmpeg()?;
    let mut octx = format::output(&path).map_err(ff)?;
    let mpeg4 = encoder::find(codec::Id::MPEG4)
        .ok_or_else(|| VideoError::Other("MPEG-4 encoder not found".into()))?;
    let frame_tb = Rational::new(1, fps);

    let mut ost = octx.add_stream(mpeg4).map_err(ff)?;
    ost.set_time_base(frame_tb);

    let mut video = codec::context::Context::new_with_codec(mpeg4)
        .encoder()
        .video()
        .map_err(ff)?;
    video.set_width(TEST_CLIP_WIDTH);
    video.set_height(TEST_CLIP_HEIGHT);
    video.set_format(format::Pixel::YUV420P);
    video.set_time_base(frame_tb);
    video.set_frame_rate(Some(Rational::new(fps, 1)));
    // Matroska keeps codec headers out of band.
    video.set_flags(codec::Flags::GLOBAL_HEADER);

    let mut encoder = video.open_as(mpeg4).map_err(ff)?;
    ost.set_parameters(&encoder);

    octx.write_header().map_err(ff)?;
    let stream_tb = octx
        .stream(0)
        .map(|s| s.time_base())
        .ok_or_else(|| VideoError::Other("output stream vanished".into()))?;

    let mut picture = frame::Video::new(format::Pixel::YUV420P, TEST_CLIP_WIDTH, TEST_CLIP_HEIGHT);
    for i in 0..frames {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let luma = (16 + (i * 8) % 220) as u8;
        picture.data_mut(0).fill(luma);
        picture.data_mut(1).fill(128);
        picture.data_mut(2).fill(128);
        picture.set_pts(Some(i));
        encoder.send_frame(&picture).map_err(ff)?;
        write_packets(&mut encoder, &mut octx, frame_tb, stream_tb)?;
    }

    encoder.send_eof().map_err(ff)?;
    write_packets(&mut encoder, &mut octx, frame_tb, stream_tb)?;
    octx.write_trailer().map_err(ff)
}

fn write_packets(
    encoder: &mut ffmpeg_next::encoder::video::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    from: ffmpeg_next::Rational,
    to: ffmpeg_next::Rational,
) -> Result<(), crate::domain::error::VideoError> {
    let mut packet = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(0);
        packet.rescale_ts(from, to);
        packet
            .write_interleaved(octx)
            .map_err(|e| crate::domain::error::VideoError::Other(e.to_string()))?;
    }
    Ok(())
}
