// SPDX-License-Identifier: MPL-2.0
//! Core media types for the domain layer.
//!
//! These types represent pure data without any decoder dependencies.

use crate::domain::video::Seconds;
use std::sync::Arc;

/// Bytes per BGRA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A decoded, presentable video frame.
///
/// Pixels are 32-bit BGRA, tightly packed (`stride == width * 4`). The
/// buffer is reference-counted so the frame can be handed from the decode
/// worker to the presentation thread without copying.
///
/// # Example
///
/// ```
/// use notchlc_player::domain::media::DecodedFrame;
/// use notchlc_player::domain::video::Seconds;
///
/// let frame = DecodedFrame::from_bgra(2, 2, vec![0u8; 16], Seconds::new(0.5));
///
/// assert_eq!(frame.width(), 2);
/// assert_eq!(frame.stride(), 8);
/// assert_eq!(frame.pts().get(), Some(0.5));
/// ```
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    width: u32,
    height: u32,
    bgra_bytes: Arc<[u8]>,
    pts: Seconds,
}

impl DecodedFrame {
    /// Creates a frame from shared BGRA pixel data.
    ///
    /// # Panics
    ///
    /// Panics if the pixel data length doesn't match `width * height * 4`.
    #[must_use]
    pub fn new(width: u32, height: u32, bgra_bytes: Arc<[u8]>, pts: Seconds) -> Self {
        let expected_len = (width as usize) * (height as usize) * BYTES_PER_PIXEL;
        assert_eq!(
            bgra_bytes.len(),
            expected_len,
            "BGRA data length mismatch: expected {expected_len}, got {}",
            bgra_bytes.len()
        );

        Self {
            width,
            height,
            bgra_bytes,
            pts,
        }
    }

    /// Creates a frame from owned BGRA pixel data.
    ///
    /// # Panics
    ///
    /// Panics if the pixel data length doesn't match `width * height * 4`.
    #[must_use]
    pub fn from_bgra(width: u32, height: u32, bgra_bytes: Vec<u8>, pts: Seconds) -> Self {
        Self::new(width, height, Arc::from(bgra_bytes), pts)
    }

    /// Returns the frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the row length in bytes.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Returns the presentation timestamp, possibly unknown.
    #[must_use]
    pub fn pts(&self) -> Seconds {
        self.pts
    }

    /// Returns the BGRA pixel data.
    #[must_use]
    pub fn bgra_bytes(&self) -> &[u8] {
        &self.bgra_bytes
    }

    /// Returns a shared handle to the pixel data.
    #[must_use]
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bgra_bytes)
    }

    /// Returns the size of the pixel data in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.bgra_bytes.len()
    }

    /// Converts the pixel data to RGBA by swapping the blue and red channels.
    #[must_use]
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = self.bgra_bytes.to_vec();
        for pixel in rgba.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.swap(0, 2);
        }
        rgba
    }
}

/// Result of pulling one frame from a frame source.
#[derive(Debug, Clone)]
pub enum FramePull {
    /// A decoded frame.
    Frame(DecodedFrame),
    /// The decoder is exhausted; no more frames will come.
    EndOfStream,
}

impl FramePull {
    /// Returns true for [`FramePull::EndOfStream`].
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

/// Stream properties exposed by an opened media handle.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Stream time base in seconds per tick, if the stream declares a usable one.
    pub time_base: Option<f64>,
    /// Average frame rate, if declared.
    pub frame_rate: Option<f64>,
    /// Container duration, else stream duration. May be unknown.
    pub declared_duration: Seconds,
    /// Canonical codec name reported by the demuxer.
    pub codec_name: String,
}

impl StreamInfo {
    /// Returns the aspect ratio, or `None` for a zero height.
    #[must_use]
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.height > 0).then(|| f64::from(self.width) / f64::from(self.height))
    }
}
