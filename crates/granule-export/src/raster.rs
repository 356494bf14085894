//! Annotated image export.
//!
//! The output format follows the file extension of the destination name,
//! limited to the formats this build can encode.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};

/// Errors from export serializers.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The destination's extension names no format this build writes.
    #[error("unsupported image format for {0:?}; use .png, .jpg, .bmp or .tiff")]
    UnsupportedFormat(String),

    /// The encoder failed.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Formats the workspace enables in the `image` crate.
const SUPPORTED: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// Encode `image` in the format implied by `destination`'s extension.
///
/// # Errors
///
/// Returns [`ExportError::UnsupportedFormat`] if the extension is missing
/// or unknown, and [`ExportError::Encode`] if encoding fails.
pub fn encode_image(image: &RgbImage, destination: &str) -> Result<Vec<u8>, ExportError> {
    let format = ImageFormat::from_path(Path::new(destination))
        .ok()
        .filter(|f| SUPPORTED.contains(f))
        .ok_or_else(|| ExportError::UnsupportedFormat(destination.to_string()))?;

    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(image.clone()).write_to(&mut Cursor::new(&mut buf), format)?;
    Ok(buf)
}
