//! Integration test: synthetic photographs of known shapes run through the
//! full pipeline, checked against their analytic measurements.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::f64::consts::PI;

use granule_pipeline::{AnalysisConfig, Pipeline, Session, process};
use image::{DynamicImage, Rgb, RgbImage};

/// White canvas with dark discs. A pixel belongs to a disc when its centre
/// is within `radius + 0.5` of the disc centre.
fn discs(width: u32, height: u32, discs: &[(f64, f64, f64)]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let inside = discs.iter().any(|&(cx, cy, r)| {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            dx.mul_add(dx, dy * dy) <= (r + 0.5) * (r + 0.5)
        });
        if inside {
            Rgb([15, 15, 15])
        } else {
            Rgb([255, 255, 255])
        }
    }))
}

/// White canvas with one dark axis-aligned square.
fn square(canvas: u32, left: u32, side: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(canvas, canvas, |x, y| {
        if (left..left + side).contains(&x) && (left..left + side).contains(&y) {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    }))
}

fn png(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn within(actual: f64, expected: f64, fraction: f64) -> bool {
    (actual - expected).abs() <= expected * fraction
}

#[test]
fn disc_radius_30_end_to_end() {
    let bytes = png(&discs(100, 100, &[(50.0, 50.0, 30.0)]));
    let config = AnalysisConfig {
        threshold: 160,
        ..AnalysisConfig::default()
    };
    let result = process(&bytes, &config).expect("pipeline should succeed");

    assert_eq!(result.particles.len(), 1);
    let p = &result.particles[0];
    eprintln!(
        "disc: area {:.4} perimeter {:.4} circularity {:.4}",
        p.area, p.perimeter, p.circularity
    );
    assert!(within(p.area, PI * 900.0, 0.03), "area {}", p.area);
    assert!(within(p.perimeter, 2.0 * PI * 30.0, 0.03), "perimeter {}", p.perimeter);
    assert!((p.circularity - 1.0).abs() <= 0.05, "circularity {}", p.circularity);
    let (cx, cy) = p.centroid.unwrap();
    assert!((49..=50).contains(&cx) && (49..=50).contains(&cy));
}

#[test]
fn discs_of_radius_20_and_up_are_round() {
    for radius in [20.0, 24.0, 33.0, 45.0] {
        let image = discs(120, 120, &[(60.0, 60.0, radius)]);
        let result = Pipeline::new(image, AnalysisConfig::default())
            .binarize()
            .extract()
            .filter()
            .into_result();
        assert_eq!(result.particles.len(), 1);
        let c = result.particles[0].circularity;
        assert!((c - 1.0).abs() <= 0.05, "radius {radius}: circularity {c}");
    }
}

#[test]
fn square_circularity_is_below_one_and_scale_invariant() {
    let small = process(&png(&square(40, 5, 12)), &AnalysisConfig::default()).unwrap();
    let large = process(&png(&square(200, 10, 150)), &AnalysisConfig::default()).unwrap();
    let (a, b) = (small.particles[0].circularity, large.particles[0].circularity);
    assert!(a < 1.0 && b < 1.0);
    assert!((a - b).abs() < 1e-9, "{a} vs {b}");
    assert!((a - PI / 4.0).abs() < 1e-9);
}

#[test]
fn min_area_bounds() {
    let image = discs(
        160,
        80,
        &[(20.0, 20.0, 6.0), (70.0, 40.0, 20.0), (130.0, 50.0, 12.0)],
    );
    let mut session = Session::default();
    session.load_image("discs.png", image);
    let all = session.analyze().unwrap().to_vec();
    assert_eq!(all.len(), 3);

    assert_eq!(session.apply_filter("0").unwrap().particles, all);

    let largest = all.iter().map(|p| p.area).fold(0.0, f64::max);
    assert!(
        session
            .apply_filter(&format!("{}", largest + 1.0))
            .unwrap()
            .particles
            .is_empty()
    );

    let kept = &session.apply_filter(&format!("{largest}")).unwrap().particles;
    assert_eq!(kept.len(), 1);
    assert!((kept[0].area - largest).abs() < f64::EPSILON);
}

#[test]
fn discovery_order_gives_increasing_indices() {
    let image = discs(
        160,
        80,
        &[(20.0, 20.0, 6.0), (70.0, 40.0, 20.0), (130.0, 50.0, 12.0)],
    );
    let result = Pipeline::new(image, AnalysisConfig::default())
        .binarize()
        .extract()
        .filter()
        .into_result();
    let indices: Vec<usize> = result.particles.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
}
