//! Geometric descriptors of a closed contour.
//!
//! [`measure`] is the only place perimeter, area, circularity and the
//! label anchor are computed. Extraction, filtering and rendering all go
//! through it, so a particle's numbers and its drawn outline always agree.

use std::f64::consts::PI;

use serde::Serialize;

use crate::types::Polyline;

/// Shape descriptors of one closed contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geometry {
    /// Sum of the Euclidean lengths of every segment, closing one included.
    pub perimeter: f64,
    /// Enclosed area from the shoelace formula; never negative.
    pub area: f64,
    /// `4π·area / perimeter²`. `0.0` when the perimeter is zero. Not
    /// clamped: polygonal approximation can push it slightly above 1.
    pub circularity: f64,
    /// Polygon centroid truncated to whole pixels, `None` when the
    /// enclosed area is zero.
    pub centroid: Option<(i32, i32)>,
}

impl Geometry {
    /// A contour with zero perimeter or zero area is not a particle.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.perimeter <= 0.0 || self.area <= 0.0
    }
}

/// Measure a closed ring.
#[must_use]
pub fn measure(ring: &Polyline) -> Geometry {
    let mut perimeter = 0.0;
    // Polygon moments: m00 is the signed area, m10/m01 the first moments.
    let mut m00 = 0.0;
    let mut m10 = 0.0;
    let mut m01 = 0.0;

    for (a, b) in ring.closed_segments() {
        perimeter += a.distance(b);
        let cross = a.x.mul_add(b.y, -(b.x * a.y));
        m00 += cross;
        m10 += (a.x + b.x) * cross;
        m01 += (a.y + b.y) * cross;
    }
    m00 /= 2.0;
    m10 /= 6.0;
    m01 /= 6.0;

    let area = m00.abs();
    let circularity = if perimeter > 0.0 {
        4.0 * PI * area / (perimeter * perimeter)
    } else {
        0.0
    };
    let centroid = (m00 != 0.0).then(|| (truncate(m10 / m00), truncate(m01 / m00)));

    Geometry {
        perimeter,
        area,
        circularity,
        centroid,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(v: f64) -> i32 {
    v as i32
}
