// SPDX-License-Identifier: MPL-2.0
//! `FFmpeg` adapter implementing the [`MediaBackend`] and [`FrameSource`] ports.
//!
//! [`FfmpegMediaHandle`] wraps a demuxer, a decoder and a BGRA scaler for the
//! best video stream of one file. [`FrameSource::next_frame`] runs the
//! demux/decode pump until one picture comes out or the decoder is exhausted.
//!
//! # Design Notes
//!
//! - Blocking, no internal threading: the player's worker owns the handle
//! - Every `FFmpeg` resource is an owned value, so a failed open unwinds
//!   whatever was already allocated
//! - `close` drops the state; later pulls report end of stream
//!
//! [`MediaBackend`]: crate::application::port::MediaBackend
//! [`FrameSource`]: crate::application::port::FrameSource

use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use tracing::{debug, trace, warn};

use crate::application::port::{FrameSource, MediaBackend};
use crate::config::defaults::DRAIN_RETRY_LIMIT;
use crate::domain::error::VideoError;
use crate::domain::media::{DecodedFrame, FramePull, StreamInfo, BYTES_PER_PIXEL};
use crate::domain::video::Seconds;
use crate::media::duration::{self, DurationProbe, Ratio};
use crate::media::{codec_gate, video};

// =============================================================================
// Backend
// =============================================================================

/// The production media stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MediaBackend for FfmpegBackend {
    fn accepts(&self, path: &Path) -> Result<bool, VideoError> {
        codec_gate::accepts(path)
    }

    fn estimate_duration(&self, path: &Path) -> Seconds {
        duration::estimate(path)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, VideoError> {
        Ok(Box::new(FfmpegMediaHandle::open(path)?))
    }
}

// =============================================================================
// Media handle
// =============================================================================

/// An opened NotchLC stream, ready to yield BGRA frames.
///
/// # Thread Safety
///
/// This type is `Send` but not `Sync`. It is moved onto the decode worker
/// and only ever used from there.
pub struct FfmpegMediaHandle {
    state: Option<HandleState>,
    info: StreamInfo,
}

/// Internal state that holds `FFmpeg` contexts.
struct HandleState {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    /// Seconds per tick; `None` leaves every timestamp unknown.
    time_base: Option<f64>,
    /// Reused decode target.
    decoded: ffmpeg_next::frame::Video,
    /// Reused scaler target.
    converted: ffmpeg_next::frame::Video,
    /// End of input reached; the decoder is being flushed.
    draining: bool,
    /// "Again" answers seen while draining.
    drain_retries: u32,
}

// SAFETY: HandleState contains FFmpeg types with internal raw pointers.
// These are safe to send between threads because:
// 1. The contexts are never shared: the handle has a single owner
// 2. We maintain exclusive access through Rust's ownership model
// 3. The handle is only used from one thread at a time (move semantics)
unsafe impl Send for HandleState {}

impl FfmpegMediaHandle {
    /// Opens the container, its best video stream, a decoder and a scaler.
    ///
    /// # Errors
    ///
    /// - [`VideoError::Io`] if the container cannot be opened or probed
    /// - [`VideoError::NoVideoStream`] if there is no video stream
    /// - [`VideoError::DecoderUnavailable`] if no decoder matches the codec
    /// - [`VideoError::InvalidDimensions`] if the decoder reports a zero size
    /// - [`VideoError::Other`] if the scaler cannot be created
    pub fn open(path: &Path) -> Result<Self, VideoError> {
        let input = video::open_input(path)?;
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or(VideoError::NoVideoStream)?;

        let stream_index = stream.index();
        let (codec_name, _) = video::codec_identity(&stream);
        let time_base = Ratio::from(stream.time_base()).to_f64();

        let context = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| VideoError::Other(format!("Failed to create codec context: {e}")))?;
        let decoder = context.decoder().video().map_err(|e| match e {
            ffmpeg_next::Error::DecoderNotFound => {
                VideoError::DecoderUnavailable(codec_name.clone())
            }
            other => VideoError::DecoderUnavailable(format!("{codec_name}: {other}")),
        })?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(VideoError::InvalidDimensions { width, height });
        }

        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            Pixel::BGRA,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .map_err(|e| VideoError::Other(format!("Failed to create scaler: {e}")))?;

        let metadata = DurationProbe::from_input(&input, path);
        let info = StreamInfo {
            width,
            height,
            time_base,
            frame_rate: metadata.frame_rate(),
            declared_duration: metadata.declared(),
            codec_name,
        };

        debug!(
            path = %path.display(),
            codec = %info.codec_name,
            width,
            height,
            fps = ?info.frame_rate,
            declared = %info.declared_duration,
            "media handle opened"
        );

        Ok(Self {
            state: Some(HandleState {
                input,
                decoder,
                scaler,
                stream_index,
                time_base,
                decoded: ffmpeg_next::frame::Video::empty(),
                converted: ffmpeg_next::frame::Video::empty(),
                draining: false,
                drain_retries: 0,
            }),
            info,
        })
    }

    /// Returns true until [`FrameSource::close`] is called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }
}

impl HandleState {
    /// Runs the pump until one picture is decoded or the decoder is exhausted.
    fn pump(&mut self) -> Result<FramePull, VideoError> {
        loop {
            match self.decoder.receive_frame(&mut self.decoded) {
                Ok(()) => return self.convert().map(FramePull::Frame),
                Err(ffmpeg_next::Error::Eof) => return Ok(FramePull::EndOfStream),
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::error::EAGAIN => {
                    if self.draining {
                        self.drain_retries += 1;
                        if self.drain_retries > DRAIN_RETRY_LIMIT {
                            debug!("decoder kept asking for input while draining");
                            return Ok(FramePull::EndOfStream);
                        }
                        // A repeated flush may itself answer "again" or EOF.
                        let _ = self.decoder.send_eof();
                    } else {
                        self.feed()?;
                    }
                }
                Err(e) => {
                    return Err(VideoError::DecodingFailed(format!(
                        "Failed to receive frame: {e}"
                    )))
                }
            }
        }
    }

    /// Reads packets until one for our stream is submitted, or switches to
    /// draining at end of input.
    fn feed(&mut self) -> Result<(), VideoError> {
        loop {
            let mut packet = ffmpeg_next::Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        // One bad packet is not fatal; the next receive decides.
                        warn!(error = %e, pts = ?packet.pts(), "decoder rejected packet");
                    }
                    return Ok(());
                }
                Err(ffmpeg_next::Error::Eof) => {
                    trace!("end of input, draining decoder");
                    self.draining = true;
                    let _ = self.decoder.send_eof();
                    return Ok(());
                }
                Err(e) => {
                    return Err(VideoError::DecodingFailed(format!(
                        "Failed to read packet: {e}"
                    )))
                }
            }
        }
    }

    /// Converts the decoded picture to tightly packed BGRA.
    fn convert(&mut self) -> Result<DecodedFrame, VideoError> {
        let pts = pts_seconds(self.decoded.timestamp(), self.time_base);

        self.scaler
            .run(&self.decoded, &mut self.converted)
            .map_err(|e| VideoError::DecodingFailed(format!("Scaling failed: {e}")))?;

        let width = self.converted.width();
        let height = self.converted.height();
        let bgra = extract_bgra_data(
            self.converted.data(0),
            self.converted.stride(0),
            width,
            height,
        )?;

        Ok(DecodedFrame::from_bgra(width, height, bgra, pts))
    }
}

/// Scales a stream timestamp to seconds. Either part missing means unknown.
#[allow(clippy::cast_precision_loss)]
fn pts_seconds(timestamp: Option<i64>, time_base: Option<f64>) -> Seconds {
    match (timestamp, time_base) {
        (Some(ts), Some(tb)) => Seconds::new(ts as f64 * tb),
        _ => Seconds::UNKNOWN,
    }
}

/// Copies a strided BGRA plane into a tightly packed buffer.
fn extract_bgra_data(
    data: &[u8],
    stride: usize,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, VideoError> {
    let row_len = width as usize * BYTES_PER_PIXEL;
    let mut bgra = Vec::with_capacity(row_len * height as usize);
    for y in 0..height as usize {
        let row_start = y * stride;
        let row = data
            .get(row_start..row_start + row_len)
            .ok_or_else(|| VideoError::DecodingFailed("Converted plane is truncated".into()))?;
        bgra.extend_from_slice(row);
    }
    Ok(bgra)
}

impl FrameSource for FfmpegMediaHandle {
    fn stream_info(&self) -> &StreamInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<FramePull, VideoError> {
        match self.state.as_mut() {
            Some(state) => state.pump(),
            None => Ok(FramePull::EndOfStream),
        }
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            debug!(codec = %self.info.codec_name, "media handle closed");
        }
    }
}

impl Drop for FfmpegMediaHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_abs_diff_eq, generate_clip, TEST_CLIP_HEIGHT, TEST_CLIP_WIDTH};

    #[test]
    fn open_fails_for_missing_file() {
        let result = FfmpegMediaHandle::open(Path::new("tests/data/absent.mov"));
        assert!(matches!(result, Err(VideoError::Io(_))));
    }

    #[test]
    fn backend_open_fails_for_missing_file() {
        let backend = FfmpegBackend::new();
        assert!(backend.open(Path::new("tests/data/absent.mov")).is_err());
        assert!(!backend.estimate_duration(Path::new("tests/data/absent.mov")).is_known());
    }

    #[test]
    fn extract_bgra_drops_row_padding() {
        // 2x2 image, stride 12 (4 bytes of padding per row)
        let mut plane = Vec::new();
        plane.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0]);
        plane.extend_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16, 0, 0, 0, 0]);

        let packed = extract_bgra_data(&plane, 12, 2, 2).unwrap();
        assert_eq!(packed, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn extract_bgra_rejects_short_plane() {
        let plane = vec![0u8; 10];
        assert!(extract_bgra_data(&plane, 8, 2, 2).is_err());
    }

    #[test]
    fn timestamps_need_a_usable_time_base() {
        assert_eq!(pts_seconds(Some(90_000), Some(1.0 / 90_000.0)).get(), Some(1.0));
        assert_eq!(pts_seconds(Some(0), Some(1.0 / 25.0)), Seconds::ZERO);
        assert!(!pts_seconds(Some(90_000), None).is_known());
        assert!(!pts_seconds(None, Some(1.0 / 25.0)).is_known());
    }

    #[test]
    fn decodes_a_generated_clip_to_end_of_stream() {
        let Some(clip) = generate_clip(20, 25) else {
            return;
        };

        let mut handle = FfmpegMediaHandle::open(&clip.path).expect("open generated clip");
        let info = handle.stream_info().clone();
        assert_eq!((info.width, info.height), (TEST_CLIP_WIDTH, TEST_CLIP_HEIGHT));
        assert_eq!(info.codec_name, "mpeg4");
        assert!(info.time_base.is_some());

        let mut timestamps = Vec::new();
        loop {
            match handle.next_frame().expect("decode generated clip") {
                FramePull::Frame(frame) => {
                    assert_eq!(frame.width(), TEST_CLIP_WIDTH);
                    assert_eq!(
                        frame.bgra_bytes().len(),
                        (TEST_CLIP_WIDTH * TEST_CLIP_HEIGHT) as usize * BYTES_PER_PIXEL
                    );
                    timestamps.push(frame.pts().get().expect("decoded frame has a timestamp"));
                }
                FramePull::EndOfStream => break,
            }
            assert!(timestamps.len() <= 1000, "pump never reached end of stream");
        }

        assert_eq!(timestamps.len(), 20);
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]), "{timestamps:?}");
        assert_abs_diff_eq!(timestamps[0], 0.0, epsilon = 0.002);
        assert_abs_diff_eq!(timestamps[19], 19.0 * clip.frame_interval(), epsilon = 0.002);

        // Exhausted stays exhausted, and close is idempotent.
        assert!(handle.next_frame().unwrap().is_end_of_stream());
        handle.close();
        assert!(!handle.is_open());
        handle.close();
        assert!(handle.next_frame().unwrap().is_end_of_stream());
    }

    #[test]
    fn backend_rejects_a_generated_mpeg4_clip() {
        let Some(clip) = generate_clip(10, 25) else {
            return;
        };

        let backend = FfmpegBackend::new();
        assert!(!backend.accepts(&clip.path).unwrap());
        let estimate = backend.estimate_duration(&clip.path);
        assert_abs_diff_eq!(
            estimate.get().expect("clip declares a duration"),
            clip.nominal_duration(),
            epsilon = 2.0 * clip.frame_interval()
        );
    }

    // Verify Send is implemented
    fn assert_send<T: Send>() {}

    #[test]
    fn handle_is_send() {
        assert_send::<FfmpegMediaHandle>();
        assert_send::<FfmpegBackend>();
    }
}
