//! Image decoding and colour-space conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, TIFF) and produces the
//! colour and single-channel buffers the rest of the pipeline works on.

use image::{DynamicImage, GrayImage, RgbImage};

use crate::types::PipelineError;

/// Decode raw image bytes into a [`DynamicImage`].
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    Ok(image::load_from_memory(bytes)?)
}

/// Convert to a single-channel luminance image.
///
/// Colour images use the `image` crate's luminance weights
/// (`0.2126*R + 0.7152*G + 0.0722*B`). An image that is already 8-bit
/// grayscale is passed through unchanged.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}

/// Convert any image to 3-channel RGB.
///
/// Single-channel input is replicated into all three channels so every
/// displayed or annotated buffer has the same layout.
#[must_use = "returns the RGB image"]
pub fn to_rgb(image: &DynamicImage) -> RgbImage {
    image.to_rgb8()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode(&[]), Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn valid_png_decodes_with_dimensions() {
        let img = image::RgbaImage::from_pixel(17, 31, image::Rgba([128, 64, 32, 255]));
        let decoded = decode(&encode_png(&img)).unwrap();
        assert_eq!(decoded.width(), 17);
        assert_eq!(decoded.height(), 31);
    }

    #[test]
    fn luminance_weights_green_over_red_over_blue() {
        let pixel = |r, g, b| {
            let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, image::Rgb([r, g, b])));
            to_grayscale(&img).get_pixel(0, 0).0[0]
        };
        let (r, g, b) = (pixel(255, 0, 0), pixel(0, 255, 0), pixel(0, 0, 255));
        assert!(
            g > r && r > b,
            "expected green > red > blue luminance, got R={r} G={g} B={b}",
        );
    }

    #[test]
    fn grayscale_passes_through() {
        let gray = GrayImage::from_fn(4, 4, |x, y| image::Luma([u8::try_from(x * 10 + y).unwrap()]));
        let out = to_grayscale(&DynamicImage::ImageLuma8(gray.clone()));
        assert_eq!(out.as_raw(), gray.as_raw());
    }

    #[test]
    fn gray_to_rgb_replicates_channels() {
        let gray = GrayImage::from_pixel(2, 2, image::Luma([77]));
        let rgb = to_rgb(&DynamicImage::ImageLuma8(gray));
        assert_eq!(rgb.get_pixel(1, 1).0, [77, 77, 77]);
    }
}
