//! Minimum-area particle filter.

use image::RgbImage;

use crate::annotate::annotate;
use crate::particle::Particle;
use crate::types::PipelineError;

/// Particles that survived the minimum-area cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResult {
    /// Cutoff the list was produced with.
    pub min_area: f64,
    /// Retained particles, in their original order and with their
    /// original indices.
    pub particles: Vec<Particle>,
}

/// Parse operator input for the minimum area.
///
/// Surrounding whitespace is ignored. The value must be a finite,
/// non-negative real number.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidMinArea`] for anything else.
pub fn parse_min_area(text: &str) -> Result<f64, PipelineError> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => {
            tracing::warn!(input = trimmed, "rejected minimum area");
            Err(PipelineError::InvalidMinArea(trimmed.to_string()))
        }
    }
}

/// Check an already numeric minimum area, such as one read from a
/// serialized [`AnalysisConfig`](crate::AnalysisConfig).
///
/// # Errors
///
/// Returns [`PipelineError::InvalidMinArea`] for a negative or non-finite
/// value.
pub fn validate_min_area(value: f64) -> Result<f64, PipelineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        tracing::warn!(min_area = value, "rejected minimum area");
        Err(PipelineError::InvalidMinArea(value.to_string()))
    }
}

/// Keep the particles whose area is at least `min_area`.
#[must_use]
pub fn filter_particles(particles: &[Particle], min_area: f64) -> FilterResult {
    let kept: Vec<Particle> = particles
        .iter()
        .filter(|p| p.area >= min_area)
        .cloned()
        .collect();
    tracing::debug!(
        min_area,
        kept = kept.len(),
        dropped = particles.len() - kept.len(),
        "filtered particles"
    );
    FilterResult {
        min_area,
        particles: kept,
    }
}

/// Draw the retained particles on a copy of `base`.
#[must_use]
pub fn render_filtered(base: &RgbImage, filtered: &FilterResult) -> RgbImage {
    annotate(base, &filtered.particles)
}
