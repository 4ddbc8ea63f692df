use crate::annotation::domain::overlay_surface::{OverlaySurface, StrokeStyle};
use crate::shared::geometry::{BoundingBox, Size};

/// One retained rectangle, ready for a vector renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct RectShape {
    pub bounds: BoundingBox,
    pub style: StrokeStyle,
}

/// Retained-mode overlay: keeps a list of rectangle shapes that a canvas
/// widget strokes on each redraw.
#[derive(Debug, Default)]
pub struct ShapeListSurface {
    size: Option<Size>,
    pending: Vec<RectShape>,
    rendered: Vec<RectShape>,
}

impl ShapeListSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[RectShape] {
        &self.rendered
    }
}

impl OverlaySurface for ShapeListSurface {
    fn resize(&mut self, size: Size) {
        self.size = Some(size);
    }

    fn size(&self) -> Size {
        self.size.unwrap_or(Size::new(0.0, 0.0))
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.rendered.clear();
    }

    fn stroke_rect(&mut self, rect: &BoundingBox, style: &StrokeStyle) {
        self.pending.push(RectShape {
            bounds: *rect,
            style: *style,
        });
    }

    fn render(&mut self) {
        self.rendered = std::mem::take(&mut self.pending);
    }

    fn rect_count(&self) -> usize {
        self.rendered.len()
    }
}
