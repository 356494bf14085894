//! Conversions between `image` RGB buffers and `tiny-skia` pixmaps.
//!
//! All overlays are drawn on opaque copies of an RGB image, so the pixmap
//! alpha is always 255 and premultiplied colour equals straight colour.

use image::{Rgb, RgbImage};
use tiny_skia::Pixmap;

/// Opaque pixmap holding a copy of `image`. `None` for a zero-sized image.
pub fn to_pixmap(image: &RgbImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.data_mut().chunks_exact_mut(4).zip(image.pixels()) {
        dst.copy_from_slice(&[src.0[0], src.0[1], src.0[2], 255]);
    }
    Some(pixmap)
}

/// Drop the alpha channel of an opaque pixmap.
pub fn from_pixmap(pixmap: &Pixmap) -> RgbImage {
    let mut out = RgbImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.data().chunks_exact(4)) {
        *dst = Rgb([src[0], src[1], src[2]]);
    }
    out
}
