//! Fit, zoom and pan state for an image shown in a fixed-size view.
//!
//! The viewport owns the buffer it displays. Showing a new buffer always
//! fits the whole image into the view and forgets any previous zoom or
//! pan. Zoom moves in steps of [`ZOOM_STEP`] and is kept as a whole number
//! of steps so repeated wheel notches never drift.

use image::{DynamicImage, RgbImage};

use crate::types::{Dimensions, Point};

/// Zoom change per wheel notch.
pub const ZOOM_STEP: f64 = 0.1;

/// Smallest zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest zoom factor.
pub const MAX_ZOOM: f64 = 10.0;

// Zoom in units of ZOOM_STEP.
const MIN_ZOOM_STEPS: u32 = 1;
const MAX_ZOOM_STEPS: u32 = 100;
const UNIT_ZOOM_STEPS: u32 = 10;

/// Displayed image plus its view transform.
#[derive(Debug, Clone)]
pub struct Viewport {
    view: Dimensions,
    image: Option<RgbImage>,
    zoom_steps: u32,
    pan: (f64, f64),
}

impl Viewport {
    /// Empty viewport of the given size.
    #[must_use]
    pub const fn new(view: Dimensions) -> Self {
        Self {
            view,
            image: None,
            zoom_steps: UNIT_ZOOM_STEPS,
            pan: (0.0, 0.0),
        }
    }

    /// Replace the displayed content with `image`.
    ///
    /// Single-channel images are expanded to three channels. Zoom returns
    /// to 1.0 and pan to zero, so the whole image is visible.
    pub fn show(&mut self, image: &DynamicImage) -> &RgbImage {
        self.zoom_steps = UNIT_ZOOM_STEPS;
        self.pan = (0.0, 0.0);
        self.image.insert(crate::grayscale::to_rgb(image))
    }

    /// Remove the displayed content.
    pub fn clear(&mut self) {
        self.image = None;
        self.reset_transform();
    }

    /// Currently displayed buffer.
    #[must_use]
    pub const fn image(&self) -> Option<&RgbImage> {
        self.image.as_ref()
    }

    /// View size.
    #[must_use]
    pub const fn view(&self) -> Dimensions {
        self.view
    }

    /// Change the view size. The image stays fitted; zoom and pan are kept.
    pub const fn resize(&mut self, view: Dimensions) {
        self.view = view;
    }

    /// Current zoom factor relative to the fitted size.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        f64::from(self.zoom_steps) * ZOOM_STEP
    }

    /// Current pan offset in view pixels.
    #[must_use]
    pub const fn pan_offset(&self) -> (f64, f64) {
        self.pan
    }

    /// Apply a wheel rotation. Positive `delta` zooms in one step, negative
    /// zooms out one step, zero does nothing.
    ///
    /// Zoom is anchored at the view centre. Returns `true` if the zoom
    /// changed; hitting [`MIN_ZOOM`] or [`MAX_ZOOM`] is a no-op.
    pub fn wheel(&mut self, delta: f64) -> bool {
        let next = if delta > 0.0 {
            (self.zoom_steps + 1).min(MAX_ZOOM_STEPS)
        } else if delta < 0.0 {
            self.zoom_steps.saturating_sub(1).max(MIN_ZOOM_STEPS)
        } else {
            return false;
        };
        if next == self.zoom_steps {
            return false;
        }
        let ratio = f64::from(next) / f64::from(self.zoom_steps);
        self.pan = (self.pan.0 * ratio, self.pan.1 * ratio);
        self.zoom_steps = next;
        tracing::trace!(zoom = self.zoom(), "viewport zoom");
        true
    }

    /// Shift the image by `(dx, dy)` view pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.pan = (self.pan.0 + dx, self.pan.1 + dy);
    }

    /// Back to the fitted view: zoom 1.0, no pan.
    pub const fn reset_transform(&mut self) {
        self.zoom_steps = UNIT_ZOOM_STEPS;
        self.pan = (0.0, 0.0);
    }

    /// Scale that fits the whole image into the view, `None` when nothing
    /// is shown or either side is zero.
    #[must_use]
    pub fn fit_scale(&self) -> Option<f64> {
        let image = self.image.as_ref()?;
        if image.width() == 0 || image.height() == 0 {
            return None;
        }
        let sx = f64::from(self.view.width) / f64::from(image.width());
        let sy = f64::from(self.view.height) / f64::from(image.height());
        Some(sx.min(sy))
    }

    /// View pixels per image pixel: fit scale times zoom.
    #[must_use]
    pub fn scale(&self) -> Option<f64> {
        self.fit_scale().map(|fit| fit * self.zoom())
    }

    /// Map an image position to view coordinates.
    #[must_use]
    pub fn image_to_view(&self, p: Point) -> Option<Point> {
        let scale = self.scale()?;
        let (icx, icy) = self.image_centre()?;
        let (vcx, vcy) = self.view_centre();
        Some(Point::new(
            (p.x - icx).mul_add(scale, vcx + self.pan.0),
            (p.y - icy).mul_add(scale, vcy + self.pan.1),
        ))
    }

    /// Map a view position to image coordinates. The result may fall
    /// outside the image.
    #[must_use]
    pub fn view_to_image(&self, p: Point) -> Option<Point> {
        let scale = self.scale()?;
        let (icx, icy) = self.image_centre()?;
        let (vcx, vcy) = self.view_centre();
        Some(Point::new(
            (p.x - vcx - self.pan.0) / scale + icx,
            (p.y - vcy - self.pan.1) / scale + icy,
        ))
    }

    fn view_centre(&self) -> (f64, f64) {
        (
            f64::from(self.view.width) / 2.0,
            f64::from(self.view.height) / 2.0,
        )
    }

    fn image_centre(&self) -> Option<(f64, f64)> {
        let image = self.image.as_ref()?;
        Some((
            f64::from(image.width()) / 2.0,
            f64::from(image.height()) / 2.0,
        ))
    }
}
