//! Source decoding and JPEG encoding.
//!
//! # Design Decisions
//!
//! - **Content sniffing**: source files are decoded by their content, not by
//!   their extension, so `.exif` or mislabelled files still decode when the
//!   bytes are a supported format.
//!
//! - **Single output format**: thumbnails are always baseline JPEG.
//!
//! - **Quality clamping**: the configured quality accepts 0-100, but the
//!   encoder needs 1-100, so 0 is clamped up.

use std::io::{self, Write};

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, RgbImage};

use crate::error::ThumbnailError;

use super::request::ThumbnailRequest;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Minimum quality the encoder accepts.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Decoding
// =============================================================================

/// Decode the source image of a validated request.
///
/// # Errors
///
/// - [`ThumbnailError::SourceNotFound`] if the file vanished after validation
/// - [`ThumbnailError::Io`] if the file cannot be read
/// - [`ThumbnailError::Decode`] if the bytes are not a supported image
pub fn decode_source(request: &ThumbnailRequest) -> Result<DynamicImage, ThumbnailError> {
    let path = request.source_path();
    let label = request.relative_path().display().to_string();

    let reader = ImageReader::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ThumbnailError::SourceNotFound {
                path: label.clone(),
            }
        } else {
            ThumbnailError::io("open source image", path, &e)
        }
    })?;

    let reader = reader
        .with_guessed_format()
        .map_err(|e| ThumbnailError::io("read source image", path, &e))?;

    reader.decode().map_err(|e| ThumbnailError::Decode {
        path: label,
        message: e.to_string(),
    })
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode an image as JPEG into memory.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Bytes, ThumbnailError> {
    let mut output = Vec::new();
    encode_jpeg_to(&mut output, image, quality)?;
    Ok(Bytes::from(output))
}

/// Encode an image as JPEG into any writer.
pub fn encode_jpeg_to<W: Write>(
    writer: &mut W,
    image: &RgbImage,
    quality: u8,
) -> Result<(), ThumbnailError> {
    let mut encoder = JpegEncoder::new_with_quality(writer, clamp_quality(quality));
    encoder
        .encode_image(image)
        .map_err(|e| ThumbnailError::Encode {
            message: e.to_string(),
        })
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Returns `true` if `quality` is an acceptable configuration value (0-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    quality <= MAX_JPEG_QUALITY
}

/// Clamp quality to the range the encoder accepts (1-100).
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
