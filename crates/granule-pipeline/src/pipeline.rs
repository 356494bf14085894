//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! ```rust
//! # use granule_pipeline::{AnalysisConfig, Pipeline, PipelineError};
//! # fn run(png: &[u8]) -> Result<(), PipelineError> {
//! let image = granule_pipeline::grayscale::decode(png)?;
//! let result = Pipeline::new(image, AnalysisConfig::default())
//!     .binarize()
//!     .extract()
//!     .filter()
//!     .into_result();
//! println!("{} particles", result.particles.len());
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state,
//! carrying all previously computed intermediates. The caller can inspect
//! the current stage's output via accessor methods at any point, and it is
//! a compile-time error to skip a stage or run them out of order.
//!
//! For interactive use, where the operator revisits earlier steps, see
//! [`Session`](crate::Session) instead.

use image::{DynamicImage, GrayImage, RgbImage};
use serde::Serialize;

use crate::annotate::annotate;
use crate::binarize::{Binarization, binarize, count_foreground};
use crate::filter::{FilterResult, filter_particles, render_filtered};
use crate::grayscale::to_rgb;
use crate::particle::{Extraction, Particle, extract_particles};
use crate::types::{AnalysisConfig, Dimensions};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing; call .binarize() to continue"]
pub struct Pending {
    config: AnalysisConfig,
    image: DynamicImage,
}

impl Pending {
    /// The image to analyse.
    #[must_use]
    pub const fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Convert to grayscale, threshold, and advance to [`Binarized`].
    pub fn binarize(self) -> Binarized {
        let binarization = binarize(&self.image, self.config.threshold);
        Binarized {
            config: self.config,
            image: self.image,
            binarization,
        }
    }
}

// ───────────────────────── Stage 1: Binarized ────────────────────────

/// Pipeline state after thresholding.
#[must_use = "pipeline stages are consumed by advancing; call .extract() to continue"]
pub struct Binarized {
    config: AnalysisConfig,
    image: DynamicImage,
    binarization: Binarization,
}

impl Binarized {
    /// Grayscale intermediate.
    #[must_use]
    pub const fn grayscale(&self) -> &GrayImage {
        &self.binarization.grayscale
    }

    /// Binary mask.
    #[must_use]
    pub const fn mask(&self) -> &GrayImage {
        &self.binarization.mask
    }

    /// Trace and measure particles, then advance to [`Extracted`].
    pub fn extract(self) -> Extracted {
        let extraction = extract_particles(&self.binarization.mask, self.config.simplify_tolerance);
        let colour = to_rgb(&self.image);
        let annotated = annotate(&colour, &extraction.particles);
        Extracted {
            config: self.config,
            binarization: self.binarization,
            colour,
            extraction,
            annotated,
        }
    }
}

// ───────────────────────── Stage 2: Extracted ────────────────────────

/// Pipeline state after particle extraction.
#[must_use = "pipeline stages are consumed by advancing; call .filter() to continue"]
pub struct Extracted {
    config: AnalysisConfig,
    binarization: Binarization,
    colour: RgbImage,
    extraction: Extraction,
    annotated: RgbImage,
}

impl Extracted {
    /// Every accepted particle, before filtering.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.extraction.particles
    }

    /// Colour image with every particle outlined and labelled.
    #[must_use]
    pub const fn annotated(&self) -> &RgbImage {
        &self.annotated
    }

    /// Apply the minimum-area cutoff and advance to [`Filtered`].
    pub fn filter(self) -> Filtered {
        let filter = filter_particles(&self.extraction.particles, self.config.min_area);
        let rendered = render_filtered(&self.colour, &filter);
        Filtered {
            config: self.config,
            binarization: self.binarization,
            extraction: self.extraction,
            filter,
            rendered,
        }
    }
}

// ───────────────────────── Stage 3: Filtered ─────────────────────────

/// Pipeline state after filtering. Terminal stage.
#[must_use = "call .into_result() to obtain the analysis result"]
pub struct Filtered {
    config: AnalysisConfig,
    binarization: Binarization,
    extraction: Extraction,
    filter: FilterResult,
    rendered: RgbImage,
}

impl Filtered {
    /// Particles that passed the filter.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.filter.particles
    }

    /// Colour image with the retained particles outlined and labelled.
    #[must_use]
    pub const fn rendered(&self) -> &RgbImage {
        &self.rendered
    }

    /// Consume the pipeline and return the final result.
    pub fn into_result(self) -> AnalysisResult {
        tracing::info!(
            extracted = self.extraction.particles.len(),
            retained = self.filter.particles.len(),
            skipped = self.extraction.skipped,
            "analysis complete"
        );
        AnalysisResult {
            dimensions: Dimensions::of(&self.binarization.mask),
            config: self.config,
            foreground_pixels: count_foreground(&self.binarization.mask),
            extracted: self.extraction.particles.len(),
            skipped: self.extraction.skipped,
            particles: self.filter.particles,
            mask: self.binarization.mask,
            rendered: self.rendered,
        }
    }
}

// ───────────────────────── Result ────────────────────────────────────

/// Outcome of one complete analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Size of the analysed image.
    pub dimensions: Dimensions,
    /// Parameters the run used.
    pub config: AnalysisConfig,
    /// Number of mask pixels classified as particle.
    pub foreground_pixels: u64,
    /// Particles found before filtering.
    pub extracted: usize,
    /// Degenerate contours dropped during extraction.
    pub skipped: usize,
    /// Particles retained by the filter.
    pub particles: Vec<Particle>,
    /// Binary mask.
    #[serde(skip)]
    pub mask: GrayImage,
    /// Colour image with the retained particles drawn on it.
    #[serde(skip)]
    pub rendered: RgbImage,
}

/// Entry point of the typestate chain.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline over an already decoded image.
    ///
    /// No processing is performed until [`.binarize()`](Pending::binarize).
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(image: DynamicImage, config: AnalysisConfig) -> Pending {
        Pending { config, image }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// White image with two dark squares of different sizes.
    fn two_squares() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(80, 40, |x, y| {
            let small = (5..11).contains(&x) && (5..11).contains(&y);
            let large = (30..60).contains(&x) && (5..35).contains(&y);
            if small || large {
                image::Rgb([20, 20, 20])
            } else {
                image::Rgb([240, 240, 240])
            }
        }))
    }

    #[test]
    fn stages_expose_intermediates() {
        let binarized = Pipeline::new(two_squares(), AnalysisConfig::default()).binarize();
        assert_eq!(binarized.mask().dimensions(), (80, 40));
        assert_eq!(binarized.grayscale().get_pixel(0, 0).0[0], 240);

        let extracted = binarized.extract();
        assert_eq!(extracted.particles().len(), 2);
        assert_eq!(extracted.annotated().dimensions(), (80, 40));
    }

    #[test]
    fn min_area_filters_small_square() {
        let config = AnalysisConfig {
            min_area: 100.0,
            ..AnalysisConfig::default()
        };
        let result = Pipeline::new(two_squares(), config)
            .binarize()
            .extract()
            .filter()
            .into_result();
        assert_eq!(result.extracted, 2);
        assert_eq!(result.particles.len(), 1);
        assert!(result.particles[0].area > 100.0);
        assert_eq!(result.foreground_pixels, 36 + 900);
    }

    #[test]
    fn threshold_zero_finds_nothing() {
        let config = AnalysisConfig {
            threshold: 0,
            ..AnalysisConfig::default()
        };
        let result = Pipeline::new(two_squares(), config)
            .binarize()
            .extract()
            .filter()
            .into_result();
        assert_eq!(result.extracted, 0);
        assert!(result.particles.is_empty());
    }

    #[test]
    fn result_serializes_without_rasters() {
        let result = Pipeline::new(two_squares(), AnalysisConfig::default())
            .binarize()
            .extract()
            .filter()
            .into_result();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("mask").is_none());
        assert_eq!(json["particles"].as_array().unwrap().len(), 2);
        assert_eq!(json["config"]["threshold"], 160);
    }
}
