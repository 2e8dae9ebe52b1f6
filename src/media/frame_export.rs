// SPDX-License-Identifier: MPL-2.0
//! Frame export for decoded video frames.
//!
//! This module saves a [`DecodedFrame`] to an image file (PNG, JPEG, WebP)
//! using the `image` crate. The CLI uses it for `--snapshot`.

use crate::domain::media::DecodedFrame;
use crate::error::{Error, Result};
use image_rs::{ImageBuffer, ImageFormat, Rgba};
use std::path::Path;

/// Supported export formats for frame capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// PNG format (lossless, best quality).
    #[default]
    Png,
    /// JPEG format (lossy, smaller file size).
    Jpeg,
    /// WebP format (modern, good compression).
    WebP,
}

impl ExportFormat {
    /// Returns the file extension for this format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::WebP => "webp",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            ExportFormat::Png => ImageFormat::Png,
            ExportFormat::Jpeg => ImageFormat::Jpeg,
            ExportFormat::WebP => ImageFormat::WebP,
        }
    }

    /// Detects format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<ExportFormat> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            "webp" => Some(ExportFormat::WebP),
            _ => None,
        }
    }

    /// Detects format from file path extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<ExportFormat> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Saves a decoded frame to `path`.
///
/// The format is taken from the path's extension when not given, PNG if
/// the extension is unknown.
///
/// # Errors
///
/// Returns an error if the image cannot be encoded or written to disk.
pub fn save_frame(frame: &DecodedFrame, path: &Path, format: Option<ExportFormat>) -> Result<()> {
    let format = format
        .or_else(|| ExportFormat::from_path(path))
        .unwrap_or_default();

    let img: ImageBuffer<Rgba<u8>, _> =
        ImageBuffer::from_raw(frame.width(), frame.height(), frame.to_rgba()).ok_or_else(
            || Error::Io("Failed to create image buffer from frame data".to_string()),
        )?;

    // JPEG has no alpha channel
    if format == ExportFormat::Jpeg {
        image_rs::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .save_with_format(path, format.image_format())
            .map_err(|e| Error::Io(format!("Failed to save frame: {e}")))?;
    } else {
        img.save_with_format(path, format.image_format())
            .map_err(|e| Error::Io(format!("Failed to save frame: {e}")))?;
    }

    tracing::debug!(path = %path.display(), ?format, "frame saved");
    Ok(())
}

/// Generates a default filename for frame export.
///
/// Format: `{video_name}_frame_{MM-SS-mmm}.{ext}`
#[must_use]
pub fn generate_default_filename(
    video_path: &Path,
    position_secs: f64,
    format: ExportFormat,
) -> String {
    let video_name = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");

    let position_secs = if position_secs.is_finite() {
        position_secs.max(0.0)
    } else {
        0.0
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total_ms = (position_secs * 1000.0).round() as u64;
    let minutes = total_ms / 60000;
    let seconds = (total_ms % 60000) / 1000;
    let millis = total_ms % 1000;

    format!(
        "{}_frame_{:02}-{:02}-{:03}.{}",
        video_name,
        minutes,
        seconds,
        millis,
        format.extension()
    )
}
