//! Binarization: grayscale conversion followed by an inverse threshold.
//!
//! Particles are assumed to be darker than the imaged background, so a
//! pixel becomes foreground when its luminance is strictly below the
//! threshold. The polarity is fixed; there is no auto-detection.

use image::{DynamicImage, GrayImage, Luma};

/// Mask value for particle pixels.
pub const FOREGROUND: u8 = 255;

/// Mask value for background pixels.
pub const BACKGROUND: u8 = 0;

/// Grayscale image and the binary mask derived from it.
#[derive(Debug, Clone)]
pub struct Binarization {
    /// Luminance of the source image.
    pub grayscale: GrayImage,
    /// Every pixel is exactly [`FOREGROUND`] or [`BACKGROUND`].
    pub mask: GrayImage,
    /// Threshold the mask was produced with.
    pub threshold: u8,
}

/// Convert `source` to grayscale and apply the inverse binary threshold.
#[must_use]
pub fn binarize(source: &DynamicImage, threshold: u8) -> Binarization {
    let grayscale = crate::grayscale::to_grayscale(source);
    let mask = threshold_inverse(&grayscale, threshold);
    tracing::debug!(
        threshold,
        foreground = count_foreground(&mask),
        width = mask.width(),
        height = mask.height(),
        "binarized"
    );
    Binarization {
        grayscale,
        mask,
        threshold,
    }
}

/// Inverse binary threshold: `gray < threshold` becomes [`FOREGROUND`].
///
/// Equality is background, so a threshold of `0` yields an empty mask.
#[must_use = "returns the binary mask"]
pub fn threshold_inverse(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut mask = gray.clone();
    for pixel in mask.pixels_mut() {
        *pixel = Luma([if pixel.0[0] < threshold {
            FOREGROUND
        } else {
            BACKGROUND
        }]);
    }
    mask
}

/// Number of foreground pixels in a mask.
#[must_use]
pub fn count_foreground(mask: &GrayImage) -> u64 {
    mask.pixels().fold(0, |n, p| n + u64::from(p.0[0] == FOREGROUND))
}
