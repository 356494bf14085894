//! Shared types for the granule particle analysis pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference the
/// grayscale and mask rasters without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference annotated
/// output without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `DynamicImage` for callers that hand decoded images to
/// [`Session::load_image`](crate::Session::load_image).
pub use image::DynamicImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A sequence of points. Contours use it as a closed ring: the last
/// point connects back to the first and is not repeated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Iterate over the closing segments `(p[i], p[i + 1 mod n])`.
    ///
    /// A single-point ring yields one zero-length segment; an empty ring
    /// yields nothing.
    pub fn closed_segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.0
            .iter()
            .zip(self.0.iter().cycle().skip(1))
            .map(|(&a, &b)| (a, b))
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of any `image` buffer.
    #[must_use]
    pub fn of<I: image::GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }
}

/// Tunable parameters for one analysis run.
///
/// The operator-facing parameters are `threshold` and `min_area`;
/// `simplify_tolerance` controls how aggressively traced boundaries are
/// straightened before measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Inverse binarization cutoff: pixels darker than this are particle.
    pub threshold: u8,

    /// Particles with an area below this value are dropped by the filter.
    pub min_area: f64,

    /// Ramer-Douglas-Peucker tolerance in pixels, applied to each closed
    /// contour after collinear compression. `0.0` keeps the compressed
    /// pixel chain as is.
    pub simplify_tolerance: f64,
}

impl AnalysisConfig {
    /// Default binarization threshold.
    pub const DEFAULT_THRESHOLD: u8 = 160;

    /// Default minimum particle area (keeps everything).
    pub const DEFAULT_MIN_AREA: f64 = 0.0;

    /// Default boundary simplification tolerance in pixels.
    pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 1.0;
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            min_area: Self::DEFAULT_MIN_AREA,
            simplify_tolerance: Self::DEFAULT_SIMPLIFY_TOLERANCE,
        }
    }
}

/// Errors reported to the operator.
///
/// None of these is fatal: every operation that returns one leaves the
/// session exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// An operation needs a loaded image and there is none.
    #[error("no image loaded")]
    NoImage,

    /// Filtering was requested before particles were extracted.
    #[error("particles have not been extracted yet")]
    NotAnalyzed,

    /// The minimum area text is not a non-negative number.
    #[error("minimum area must be a non-negative number, got {0:?}")]
    InvalidMinArea(String),

    /// The crop preview cannot fit a minimum-size crop rectangle.
    #[error("preview {width}x{height} is smaller than the minimum crop size")]
    PreviewTooSmall {
        /// Preview width in pixels.
        width: u32,
        /// Preview height in pixels.
        height: u32,
    },

    /// The committed crop rectangle falls outside the original image.
    #[error(
        "crop region ({left}, {top})-({right}, {bottom}) is outside the {width}x{height} image"
    )]
    CropOutOfBounds {
        /// Left edge in original pixels.
        left: i64,
        /// Top edge in original pixels.
        top: i64,
        /// Right edge in original pixels.
        right: i64,
        /// Bottom edge in original pixels.
        bottom: i64,
        /// Original image width.
        width: u32,
        /// Original image height.
        height: u32,
    },

    /// The committed crop rectangle maps to zero pixels.
    #[error("crop region is empty")]
    CropDegenerate,

    /// Export was requested before a filtered result exists.
    #[error("nothing to export: run the analysis and the filter first")]
    NothingToExport,
}
