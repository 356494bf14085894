//! Interactive crop-region editor.
//!
//! The editor works on a scaled preview of the image centred inside a
//! widget. It is a pure state machine: [`CropEditor::update`] consumes the
//! current state and one [`PointerEvent`] and returns the next state plus
//! the [`Effect`]s the front end should carry out (repaint, change the
//! cursor). Nothing here touches a window system.
//!
//! The rectangle's edges are dragged individually. Every edit keeps the
//! rectangle at least [`MIN_CROP_SIZE`] preview units wide and tall, and
//! only the edge being dragged ever moves.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use tiny_skia::{Paint, PathBuilder, Rect, Stroke, Transform};

use crate::canvas::{from_pixmap, to_pixmap};
use crate::types::{Dimensions, PipelineError};

/// How close (in preview units) the pointer must be to an edge to grab it.
pub const DRAG_THRESHOLD: f64 = 10.0;

/// Minimum width and height of the crop rectangle in preview units.
pub const MIN_CROP_SIZE: f64 = 20.0;

/// Distance of the default rectangle from each preview edge.
pub const DEFAULT_INSET: f64 = 20.0;

/// Alpha of the black shade drawn outside the crop rectangle.
pub const SHADE_ALPHA: u8 = 80;

/// Width of the red crop outline.
pub const OUTLINE_WIDTH: f32 = 4.0;

/// One side of the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Left side.
    Left,
    /// Right side.
    Right,
    /// Top side.
    Top,
    /// Bottom side.
    Bottom,
}

/// Whether an edge is currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    /// No edge held.
    #[default]
    Idle,
    /// The given edge follows the pointer.
    Dragging(Edge),
}

/// Mouse button identity. Only [`Primary`](Self::Primary) drives the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Usually the left button.
    Primary,
    /// Usually the right button.
    Secondary,
    /// Wheel click.
    Middle,
}

/// Pointer input in widget coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed.
    Down {
        /// Horizontal widget position.
        x: f64,
        /// Vertical widget position.
        y: f64,
        /// Which button.
        button: PointerButton,
    },
    /// Pointer moved, pressed or not.
    Move {
        /// Horizontal widget position.
        x: f64,
        /// Vertical widget position.
        y: f64,
    },
    /// Button released.
    Up {
        /// Horizontal widget position.
        x: f64,
        /// Vertical widget position.
        y: f64,
        /// Which button.
        button: PointerButton,
    },
}

/// Pointer shape the front end should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Ordinary arrow.
    Default,
    /// Over the left or right edge.
    HorizontalResize,
    /// Over the top or bottom edge.
    VerticalResize,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The rectangle changed; repaint the overlay.
    Redraw,
    /// Change the pointer shape.
    SetCursor(Cursor),
}

/// Crop rectangle in preview coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge.
    pub bottom: f64,
}

impl CropRect {
    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Crop region in original image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

/// Crop editor state.
#[derive(Debug, Clone, PartialEq)]
pub struct CropEditor {
    preview: Dimensions,
    offset: (f64, f64),
    rect: CropRect,
    drag: DragState,
}

impl CropEditor {
    /// Editor for a `preview`-sized image centred in a `widget`-sized area,
    /// starting from the default rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::PreviewTooSmall`] if either preview side
    /// is shorter than [`MIN_CROP_SIZE`].
    pub fn new(preview: Dimensions, widget: Dimensions) -> Result<Self, PipelineError> {
        if f64::from(preview.width) < MIN_CROP_SIZE || f64::from(preview.height) < MIN_CROP_SIZE {
            return Err(PipelineError::PreviewTooSmall {
                width: preview.width,
                height: preview.height,
            });
        }
        let offset_x = (i64::from(widget.width) - i64::from(preview.width)).div_euclid(2);
        let offset_y = (i64::from(widget.height) - i64::from(preview.height)).div_euclid(2);
        #[allow(clippy::cast_precision_loss)]
        let offset = (offset_x as f64, offset_y as f64);
        Ok(Self {
            preview,
            offset,
            rect: default_rect(preview),
            drag: DragState::Idle,
        })
    }

    /// Scale `image` to fit `widget` and build an editor over the result.
    ///
    /// Returns the editor together with the preview image it edits.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::PreviewTooSmall`] if the fitted preview
    /// cannot hold a minimum-size rectangle.
    pub fn for_image(image: &RgbImage, widget: Dimensions) -> Result<(Self, RgbImage), PipelineError> {
        let fitted = fit_within(Dimensions::of(image), widget);
        let editor = Self::new(fitted, widget)?;
        let preview = if fitted == Dimensions::of(image) {
            image.clone()
        } else {
            imageops::resize(image, fitted.width, fitted.height, FilterType::Triangle)
        };
        tracing::debug!(
            preview_width = fitted.width,
            preview_height = fitted.height,
            "crop editor ready"
        );
        Ok((editor, preview))
    }

    /// Current rectangle in preview coordinates.
    #[must_use]
    pub const fn rect(&self) -> CropRect {
        self.rect
    }

    /// Current drag state.
    #[must_use]
    pub const fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Preview dimensions.
    #[must_use]
    pub const fn preview(&self) -> Dimensions {
        self.preview
    }

    /// Top-left corner of the preview inside the widget.
    #[must_use]
    pub const fn offset(&self) -> (f64, f64) {
        self.offset
    }

    /// Apply one pointer event.
    #[must_use = "the editor is consumed; use the returned state"]
    pub fn update(mut self, event: PointerEvent) -> (Self, Vec<Effect>) {
        match event {
            PointerEvent::Down {
                x,
                y,
                button: PointerButton::Primary,
            } => {
                let (px, py) = self.to_preview(x, y);
                let hit = self.hit_test(px, py);
                self.drag = hit.map_or(DragState::Idle, DragState::Dragging);
                (self, vec![Effect::SetCursor(cursor_for(hit))])
            }
            PointerEvent::Move { x, y } => {
                let (px, py) = self.to_preview(x, y);
                if let DragState::Dragging(edge) = self.drag {
                    self.move_edge(edge, px, py);
                    (self, vec![Effect::Redraw])
                } else {
                    let hit = self.hit_test(px, py);
                    (self, vec![Effect::SetCursor(cursor_for(hit))])
                }
            }
            PointerEvent::Up {
                button: PointerButton::Primary,
                ..
            } => {
                self.drag = DragState::Idle;
                (self, vec![Effect::SetCursor(Cursor::Default)])
            }
            PointerEvent::Down { .. } | PointerEvent::Up { .. } => (self, Vec::new()),
        }
    }

    /// Place `edge` at `position` (preview units) as if it had been
    /// dragged there, with the same clamps.
    #[must_use = "the editor is consumed; use the returned state"]
    pub fn set_edge(mut self, edge: Edge, position: f64) -> (Self, Vec<Effect>) {
        self.move_edge(edge, position, position);
        (self, vec![Effect::Redraw])
    }

    /// Restore the default rectangle and drop any drag in progress.
    #[must_use = "the editor is consumed; use the returned state"]
    pub fn reset(mut self) -> (Self, Vec<Effect>) {
        self.rect = default_rect(self.preview);
        self.drag = DragState::Idle;
        (self, vec![Effect::Redraw, Effect::SetCursor(Cursor::Default)])
    }

    /// Map the rectangle onto an `original`-sized image.
    ///
    /// Each edge is multiplied by the preview-to-original scale of its
    /// axis and truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::CropOutOfBounds`] if the mapped rectangle
    /// leaves the image and [`PipelineError::CropDegenerate`] if it covers
    /// no pixels.
    #[allow(clippy::cast_possible_truncation)]
    pub fn commit(&self, original: Dimensions) -> Result<PixelRect, PipelineError> {
        let scale_w = f64::from(original.width) / f64::from(self.preview.width);
        let scale_h = f64::from(original.height) / f64::from(self.preview.height);
        let left = (self.rect.left * scale_w) as i64;
        let top = (self.rect.top * scale_h) as i64;
        let right = (self.rect.right * scale_w) as i64;
        let bottom = (self.rect.bottom * scale_h) as i64;

        if left < 0
            || top < 0
            || right > i64::from(original.width)
            || bottom > i64::from(original.height)
        {
            tracing::warn!(left, top, right, bottom, "crop outside image");
            return Err(PipelineError::CropOutOfBounds {
                left,
                top,
                right,
                bottom,
                width: original.width,
                height: original.height,
            });
        }
        if right <= left || bottom <= top {
            return Err(PipelineError::CropDegenerate);
        }

        let to_u32 = |v: i64| u32::try_from(v).map_err(|_| PipelineError::CropDegenerate);
        Ok(PixelRect {
            x: to_u32(left)?,
            y: to_u32(top)?,
            width: to_u32(right - left)?,
            height: to_u32(bottom - top)?,
        })
    }

    /// Shade everything outside the rectangle and outline it in red, on a
    /// copy of `preview`.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn render_overlay(&self, preview: &RgbImage) -> RgbImage {
        let Some(mut pixmap) = to_pixmap(preview) else {
            return preview.clone();
        };
        let w = preview.width() as f32;
        let h = preview.height() as f32;
        let CropRect {
            left,
            top,
            right,
            bottom,
        } = self.rect;
        let (l, t, r, b) = (left as f32, top as f32, right as f32, bottom as f32);

        let mut shade = Paint::default();
        shade.set_color_rgba8(0, 0, 0, SHADE_ALPHA);
        shade.anti_alias = false;
        let bands = [
            Rect::from_ltrb(0.0, 0.0, w, t),
            Rect::from_ltrb(0.0, b, w, h),
            Rect::from_ltrb(0.0, t, l, b),
            Rect::from_ltrb(r, t, w, b),
        ];
        // A band is empty or absent when the rectangle touches that side.
        for band in bands.into_iter().flatten() {
            pixmap.fill_rect(band, &shade, Transform::identity(), None);
        }

        if let Some(outline) = Rect::from_ltrb(l, t, r, b).map(PathBuilder::from_rect) {
            let mut red = Paint::default();
            red.set_color_rgba8(255, 0, 0, 255);
            red.anti_alias = false;
            let stroke = Stroke {
                width: OUTLINE_WIDTH,
                ..Stroke::default()
            };
            pixmap.stroke_path(&outline, &red, &stroke, Transform::identity(), None);
        }

        from_pixmap(&pixmap)
    }

    /// Widget position to preview position, clamped onto the preview.
    fn to_preview(&self, x: f64, y: f64) -> (f64, f64) {
        let px = (x - self.offset.0).clamp(0.0, f64::from(self.preview.width));
        let py = (y - self.offset.1).clamp(0.0, f64::from(self.preview.height));
        (px, py)
    }

    /// Edge under the pointer. Checked left, right, top, bottom; the first
    /// match wins.
    fn hit_test(&self, x: f64, y: f64) -> Option<Edge> {
        let r = &self.rect;
        let in_rows = r.top <= y && y <= r.bottom;
        let in_cols = r.left <= x && x <= r.right;
        if (x - r.left).abs() <= DRAG_THRESHOLD && in_rows {
            Some(Edge::Left)
        } else if (x - r.right).abs() <= DRAG_THRESHOLD && in_rows {
            Some(Edge::Right)
        } else if (y - r.top).abs() <= DRAG_THRESHOLD && in_cols {
            Some(Edge::Top)
        } else if (y - r.bottom).abs() <= DRAG_THRESHOLD && in_cols {
            Some(Edge::Bottom)
        } else {
            None
        }
    }

    fn move_edge(&mut self, edge: Edge, x: f64, y: f64) {
        let w = f64::from(self.preview.width);
        let h = f64::from(self.preview.height);
        let r = &mut self.rect;
        match edge {
            Edge::Left => r.left = x.min(r.right - MIN_CROP_SIZE).max(0.0),
            Edge::Right => r.right = x.max(r.left + MIN_CROP_SIZE).min(w),
            Edge::Top => r.top = y.min(r.bottom - MIN_CROP_SIZE).max(0.0),
            Edge::Bottom => r.bottom = y.max(r.top + MIN_CROP_SIZE).min(h),
        }
    }
}

/// Inset rectangle; the inset shrinks on previews too small for
/// [`DEFAULT_INSET`] so the minimum size still holds.
fn default_rect(preview: Dimensions) -> CropRect {
    let w = f64::from(preview.width);
    let h = f64::from(preview.height);
    let inset_x = DEFAULT_INSET.min((w - MIN_CROP_SIZE) / 2.0).max(0.0);
    let inset_y = DEFAULT_INSET.min((h - MIN_CROP_SIZE) / 2.0).max(0.0);
    CropRect {
        left: inset_x,
        top: inset_y,
        right: w - inset_x,
        bottom: h - inset_y,
    }
}

const fn cursor_for(edge: Option<Edge>) -> Cursor {
    match edge {
        Some(Edge::Left | Edge::Right) => Cursor::HorizontalResize,
        Some(Edge::Top | Edge::Bottom) => Cursor::VerticalResize,
        None => Cursor::Default,
    }
}

/// Largest size with `original`'s aspect ratio that fits in `bounds`.
///
/// Sizes are truncated to whole pixels and never drop below 1.
#[must_use]
pub fn fit_within(original: Dimensions, bounds: Dimensions) -> Dimensions {
    if original.width == 0 || original.height == 0 {
        return bounds;
    }
    let (ow, oh) = (u64::from(original.width), u64::from(original.height));
    let (bw, bh) = (u64::from(bounds.width), u64::from(bounds.height));
    let width_at_full_height = bh * ow / oh;
    let (w, h) = if width_at_full_height <= bw {
        (width_at_full_height, bh)
    } else {
        (bw, bw * oh / ow)
    };
    Dimensions {
        width: u32::try_from(w.max(1)).unwrap_or(u32::MAX),
        height: u32::try_from(h.max(1)).unwrap_or(u32::MAX),
    }
}

/// Extract the committed region from `image`.
#[must_use]
pub fn crop_image(image: &DynamicImage, rect: PixelRect) -> DynamicImage {
    image.crop_imm(rect.x, rect.y, rect.width, rect.height)
}
