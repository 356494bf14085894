//! Particle extraction: trace external contours in a mask and measure
//! each one.

use image::GrayImage;
use serde::Serialize;

use crate::contour::{ContourTracerKind, trace_particles};
use crate::measure::{Geometry, measure};
use crate::types::Polyline;

/// One measured particle.
///
/// Values are kept at full precision; rounding happens only when they
/// are displayed or exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    /// 1-based position of the contour in discovery order. Degenerate
    /// contours consume an index too, so the sequence can have gaps.
    pub index: usize,
    /// Closed-contour length in pixels.
    pub perimeter: f64,
    /// Enclosed area in square pixels.
    pub area: f64,
    /// `4π·area / perimeter²`.
    pub circularity: f64,
    /// Label anchor.
    pub centroid: Option<(i32, i32)>,
    /// The ring the numbers were measured from.
    #[serde(skip)]
    pub contour: Polyline,
}

impl Particle {
    /// Measure `contour` and wrap it as a particle.
    #[must_use]
    pub fn new(index: usize, contour: Polyline) -> Self {
        let Geometry {
            perimeter,
            area,
            circularity,
            centroid,
        } = measure(&contour);
        Self {
            index,
            perimeter,
            area,
            circularity,
            centroid,
            contour,
        }
    }
}

/// Result of tracing and measuring one mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Accepted particles in discovery order.
    pub particles: Vec<Particle>,
    /// Contours dropped for zero perimeter or zero area.
    pub skipped: usize,
}

/// Find every external contour in `mask` and measure it.
///
/// Contours whose perimeter or area is zero (isolated pixels, one-pixel
/// lines) are skipped silently.
#[must_use]
pub fn extract_particles(mask: &GrayImage, simplify_tolerance: f64) -> Extraction {
    let rings = trace_particles(ContourTracerKind::default(), mask, simplify_tolerance);

    let mut particles = Vec::with_capacity(rings.len());
    let mut skipped = 0;
    for (index, ring) in (1..).zip(rings) {
        let particle = Particle::new(index, ring);
        if particle.perimeter <= 0.0 || particle.area <= 0.0 {
            skipped += 1;
            continue;
        }
        particles.push(particle);
    }

    tracing::debug!(particles = particles.len(), skipped, "extracted particles");
    Extraction { particles, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnalysisConfig;

    fn fill_rect(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, image::Luma([255]));
            }
        }
    }

    #[test]
    fn empty_mask_has_no_particles() {
        let extraction = extract_particles(&GrayImage::new(32, 32), 1.0);
        assert!(extraction.particles.is_empty());
        assert_eq!(extraction.skipped, 0);
    }

    #[test]
    fn rectangle_is_measured_through_pixel_centres() {
        let mut mask = GrayImage::new(40, 40);
        fill_rect(&mut mask, 5, 5, 25, 15);
        let extraction = extract_particles(&mask, 1.0);
        assert_eq!(extraction.particles.len(), 1);
        let p = &extraction.particles[0];
        assert_eq!(p.index, 1);
        // Corners at (5,5) and (24,14): 19 x 9.
        assert!((p.area - 171.0).abs() < 1e-9);
        assert!((p.perimeter - 56.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_contours_leave_index_gaps() {
        let mut mask = GrayImage::new(40, 40);
        // Isolated pixel found first, then a one-pixel line, then a block.
        mask.put_pixel(2, 2, image::Luma([255]));
        fill_rect(&mut mask, 10, 6, 20, 7);
        fill_rect(&mut mask, 5, 20, 15, 30);
        let extraction = extract_particles(&mask, 1.0);
        assert_eq!(extraction.skipped, 2);
        assert_eq!(extraction.particles.len(), 1);
        assert_eq!(extraction.particles[0].index, 3);
    }

    #[test]
    fn every_particle_is_positive() {
        let mut mask = GrayImage::new(64, 64);
        fill_rect(&mut mask, 2, 2, 10, 10);
        fill_rect(&mut mask, 20, 4, 23, 30);
        fill_rect(&mut mask, 40, 40, 60, 44);
        for p in extract_particles(&mask, 1.0).particles {
            assert!(p.perimeter > 0.0 && p.area > 0.0, "{p:?}");
            let expected = 4.0 * std::f64::consts::PI * p.area / (p.perimeter * p.perimeter);
            assert!((p.circularity - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn two_pixel_wide_particles_survive_default_simplification() {
        // 2x2, 2x10 and 2x50 blocks: compressed outlines measure 1, 9 and 49.
        for (height, area) in [(2, 1.0), (10, 9.0), (50, 49.0)] {
            let mut mask = GrayImage::new(80, 80);
            fill_rect(&mut mask, 10, 10, 12, 10 + height);
            let extraction = extract_particles(&mask, AnalysisConfig::DEFAULT_SIMPLIFY_TOLERANCE);
            assert_eq!(extraction.skipped, 0, "2x{height}");
            assert_eq!(extraction.particles.len(), 1, "2x{height}");
            assert!((extraction.particles[0].area - area).abs() < 1e-9, "2x{height}");
        }
    }

    #[test]
    fn serialized_particle_omits_contour() {
        let mut mask = GrayImage::new(20, 20);
        fill_rect(&mut mask, 4, 4, 10, 10);
        let p = &extract_particles(&mask, 1.0).particles[0];
        let json = serde_json::to_value(p).unwrap_or_default();
        assert!(json.get("contour").is_none());
        assert_eq!(json["index"], 1);
    }
}
