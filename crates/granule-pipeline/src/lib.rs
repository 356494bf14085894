//! granule-pipeline: Pure particle analysis pipeline (sans-IO).
//!
//! Turns a photograph of granular material into per-particle shape
//! measurements through:
//! grayscale -> inverse threshold -> external contour tracing ->
//! boundary simplification -> measurement -> minimum-area filter.
//!
//! It also holds the interactive pieces a front end needs: the
//! [`CropEditor`] state machine, the [`Viewport`] transform and the
//! [`Session`] that ties them to the analysis.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and image buffers and returns structured data. File
//! handling lives in the `granule` binary and serialization in
//! `granule-export`.

pub mod annotate;
pub mod binarize;
mod canvas;
pub mod contour;
pub mod crop;
pub mod filter;
pub mod grayscale;
pub mod measure;
pub mod particle;
pub mod pipeline;
pub mod session;
pub mod simplify;
pub mod types;
pub mod viewport;

pub use binarize::Binarization;
pub use contour::{ContourTracer, ContourTracerKind};
pub use crop::{CropEditor, CropRect, Cursor, DragState, Edge, Effect, PixelRect, PointerButton, PointerEvent};
pub use filter::FilterResult;
pub use measure::{Geometry, measure};
pub use particle::{Extraction, Particle};
pub use pipeline::{AnalysisResult, Pipeline};
pub use session::Session;
pub use types::{AnalysisConfig, Dimensions, PipelineError, Point, Polyline};
pub use viewport::Viewport;

/// Run the full analysis on encoded image bytes.
///
/// Decodes the image, then runs every [`Pipeline`] stage with `config`.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
/// Returns [`PipelineError::InvalidMinArea`] if `config.min_area` is
/// negative or not finite.
pub fn process(image_bytes: &[u8], config: &AnalysisConfig) -> Result<AnalysisResult, PipelineError> {
    filter::validate_min_area(config.min_area)?;
    let image = grayscale::decode(image_bytes)?;
    Ok(Pipeline::new(image, config.clone())
        .binarize()
        .extract()
        .filter()
        .into_result())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// PNG of a light background with one dark rectangle.
    fn rectangle_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            if (5..25).contains(&x) && (5..15).contains(&y) {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
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
    fn process_empty_input() {
        let result = process(&[], &AnalysisConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(&[0xFF, 0x00], &AnalysisConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn process_uniform_image_has_no_particles() {
        let img = image::GrayImage::from_pixel(20, 20, image::Luma([200]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        let result = process(&buf, &AnalysisConfig::default()).unwrap();
        assert!(result.particles.is_empty());
        assert_eq!(result.foreground_pixels, 0);
    }

    #[test]
    fn process_rejects_bad_min_area() {
        let png = rectangle_png(40, 30);
        for min_area in [-1.0, f64::NAN, f64::INFINITY] {
            let config = AnalysisConfig {
                min_area,
                ..AnalysisConfig::default()
            };
            assert!(
                matches!(process(&png, &config), Err(PipelineError::InvalidMinArea(_))),
                "min_area {min_area}"
            );
        }
    }

    #[test]
    fn process_rectangle() {
        let png = rectangle_png(40, 30);
        let result = process(&png, &AnalysisConfig::default()).unwrap();
        assert_eq!(
            result.dimensions,
            Dimensions {
                width: 40,
                height: 30
            }
        );
        assert_eq!(result.particles.len(), 1);
        let p = &result.particles[0];
        assert_eq!(p.index, 1);
        assert!((p.area - 171.0).abs() < 1e-9);
        assert!(p.circularity < 1.0);
    }
}
