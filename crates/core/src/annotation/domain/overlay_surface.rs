use crate::shared::constants::{OVERLAY_STROKE_COLOR, OVERLAY_STROKE_WIDTH};
use crate::shared::geometry::{BoundingBox, Size};

/// Outline style for face rectangles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Straight RGBA.
    pub color: [u8; 4],
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: OVERLAY_STROKE_COLOR,
            width: OVERLAY_STROKE_WIDTH,
        }
    }
}

/// A transparent drawing layer stacked over the video.
///
/// Holds no state across applied results: every result resizes, clears and
/// redraws it.
pub trait OverlaySurface {
    /// Matches the surface to the displayed video size. Implementations may
    /// round to whole pixels.
    fn resize(&mut self, size: Size);

    fn size(&self) -> Size;

    /// Drops every rectangle, pending or rendered.
    fn clear(&mut self);

    /// Queues one rectangle outline in surface pixel coordinates.
    fn stroke_rect(&mut self, rect: &BoundingBox, style: &StrokeStyle);

    /// Makes everything stroked since the last clear visible.
    fn render(&mut self);

    /// Number of rectangles currently visible.
    fn rect_count(&self) -> usize;
}
