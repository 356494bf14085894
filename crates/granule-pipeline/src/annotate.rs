//! Particle overlay: contour outlines and measurement labels drawn on a
//! copy of the analysed colour image.
//!
//! Outlines are stroked with `tiny-skia`; labels use the public-domain
//! 8x8 bitmap font from `font8x8`, scaled up so they stay legible on
//! photographs. The source buffer is never modified.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Stroke, Transform};

use crate::canvas::{from_pixmap, to_pixmap};
use crate::measure::{Geometry, measure};
use crate::particle::Particle;
use crate::types::Polyline;

/// Outline and label colour.
pub const OVERLAY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline stroke width in pixels.
pub const OUTLINE_WIDTH: f32 = 3.0;

/// Each font pixel becomes a `LABEL_SCALE` x `LABEL_SCALE` block.
pub const LABEL_SCALE: u32 = 2;

const GLYPH_SIZE: u32 = 8;

/// Draw every particle's outline and label on a copy of `base`.
///
/// Labels are re-derived from each particle's contour through
/// [`measure`], the same function extraction uses, and anchored with
/// their baseline at the centroid. Particles without a centroid get an
/// outline only.
#[must_use]
pub fn annotate(base: &RgbImage, particles: &[Particle]) -> RgbImage {
    let mut out = stroke_outlines(base, particles.iter().map(|p| &p.contour));

    for particle in particles {
        let geometry = measure(&particle.contour);
        if let Some((cx, cy)) = geometry.centroid {
            draw_text(
                &mut out,
                &label_text(&geometry),
                i64::from(cx),
                i64::from(cy),
                OVERLAY_COLOR,
            );
        }
    }

    tracing::debug!(particles = particles.len(), "annotated image");
    out
}

/// Label shown next to a particle: `C:<circularity> A:<area> L:<perimeter>`.
#[must_use]
pub fn label_text(geometry: &Geometry) -> String {
    format!(
        "C:{} A:{} L:{}",
        round4(geometry.circularity),
        round4(geometry.area),
        round4(geometry.perimeter),
    )
}

/// Round to four decimals and drop redundant trailing zeros, keeping at
/// least one digit after the point (`2828.0`, `0.9856`, `188.5`).
#[must_use]
pub fn round4(value: f64) -> String {
    let fixed = format!("{value:.4}");
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

/// Stroke closed rings onto a copy of `base`.
#[allow(clippy::cast_possible_truncation)]
fn stroke_outlines<'a>(base: &RgbImage, rings: impl Iterator<Item = &'a Polyline>) -> RgbImage {
    let Some(mut pixmap) = to_pixmap(base) else {
        return base.clone();
    };

    let stroke = Stroke {
        width: OUTLINE_WIDTH,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let mut paint = Paint::default();
    let [r, g, b] = OVERLAY_COLOR.0;
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = false;

    for ring in rings {
        let points = ring.points();
        let mut pb = PathBuilder::new();
        if let Some(first) = points.first() {
            pb.move_to(first.x as f32, first.y as f32);
            for p in &points[1..] {
                pb.line_to(p.x as f32, p.y as f32);
            }
            pb.close();
        }
        // Single-point rings have no path; nothing to draw.
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    from_pixmap(&pixmap)
}

/// Draw `text` with its baseline at `(x, y)`, clipped to the image.
fn draw_text(image: &mut RgbImage, text: &str, x: i64, y: i64, color: Rgb<u8>) {
    let advance = i64::from(GLYPH_SIZE * LABEL_SCALE);
    let top = y - advance;
    for (i, ch) in (0_i64..).zip(text.chars()) {
        if let Some(glyph) = BASIC_FONTS.get(ch) {
            draw_glyph(image, &glyph, x + i * advance, top, color);
        }
    }
}

fn draw_glyph(image: &mut RgbImage, glyph: &[u8; 8], left: i64, top: i64, color: Rgb<u8>) {
    let scale = i64::from(LABEL_SCALE);
    for (row, bits) in (0_i64..).zip(glyph) {
        for col in 0..i64::from(GLYPH_SIZE) {
            if (bits >> col) & 1 == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    put_clipped(image, left + col * scale + dx, top + row * scale + dy, color);
                }
            }
        }
    }
}

fn put_clipped(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y))
        && x < image.width()
        && y < image.height()
    {
        image.put_pixel(x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn square_particle(index: usize, left: f64, top: f64, side: f64) -> Particle {
        let contour = Polyline::new(vec![
            Point::new(left, top),
            Point::new(left + side, top),
            Point::new(left + side, top + side),
            Point::new(left, top + side),
        ]);
        Particle::new(index, contour)
    }

    #[test]
    fn round4_formatting() {
        assert_eq!(round4(2828.0), "2828.0");
        assert_eq!(round4(0.985_64), "0.9856");
        assert_eq!(round4(188.5), "188.5");
        assert_eq!(round4(0.785_398_163), "0.7854");
    }

    #[test]
    fn label_uses_all_three_measurements() {
        let geometry = measure(&square_particle(1, 0.0, 0.0, 10.0).contour);
        assert_eq!(label_text(&geometry), "C:0.7854 A:100.0 L:40.0");
    }

    #[test]
    fn source_is_not_modified() {
        let base = RgbImage::from_pixel(60, 60, Rgb([200, 200, 200]));
        let before = base.clone();
        let out = annotate(&base, &[square_particle(1, 10.0, 10.0, 30.0)]);
        assert_eq!(base, before);
        assert_ne!(out, base);
    }

    #[test]
    fn outline_is_green() {
        let base = RgbImage::from_pixel(60, 60, Rgb([0, 0, 0]));
        let out = annotate(&base, &[square_particle(1, 10.0, 10.0, 30.0)]);
        // Midpoint of the left edge, well away from the label.
        assert_eq!(*out.get_pixel(10, 25), OVERLAY_COLOR);
        // Far corner is untouched.
        assert_eq!(*out.get_pixel(55, 55), Rgb([0, 0, 0]));
    }

    #[test]
    fn label_drawn_near_centroid() {
        let base = RgbImage::from_pixel(200, 100, Rgb([0, 0, 0]));
        let particle = square_particle(1, 5.0, 5.0, 4.0);
        let out = annotate(&base, &[particle]);
        // Centroid is (7, 7). The label's baseline sits there and its top is
        // clipped by the image edge; x >= 20 is clear of the outline.
        let label_pixels = (20..200)
            .flat_map(|x| (0..7).map(move |y| (x, y)))
            .filter(|&(x, y)| *out.get_pixel(x, y) == OVERLAY_COLOR)
            .count();
        assert!(label_pixels > 0, "expected label glyph pixels");
    }

    #[test]
    fn empty_particle_list_copies_base() {
        let base = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        assert_eq!(annotate(&base, &[]), base);
    }

    #[test]
    fn zero_sized_image_is_returned_as_is() {
        let base = RgbImage::new(0, 0);
        assert_eq!(annotate(&base, &[square_particle(1, 0.0, 0.0, 2.0)]).dimensions(), (0, 0));
    }
}
