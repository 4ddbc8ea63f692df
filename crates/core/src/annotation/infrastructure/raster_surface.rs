use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::annotation::domain::overlay_surface::{OverlaySurface, StrokeStyle};
use crate::shared::geometry::{BoundingBox, Size};

/// Immediate-mode overlay: rectangles are rasterized into a transparent RGBA
/// buffer the same size as the displayed video.
pub struct RasterSurface {
    image: RgbaImage,
    pending: usize,
    visible: usize,
    revision: u64,
}

impl RasterSurface {
    pub fn new() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
            pending: 0,
            visible: 0,
            revision: 0,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Bumped on every render so views know when to re-upload the buffer.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlaySurface for RasterSurface {
    fn resize(&mut self, size: Size) {
        let width = size.width.round().max(0.0) as u32;
        let height = size.height.round().max(0.0) as u32;
        if self.image.dimensions() != (width, height) {
            self.image = RgbaImage::new(width, height);
            self.pending = 0;
        }
    }

    fn size(&self) -> Size {
        let (w, h) = self.image.dimensions();
        Size::new(w as f64, h as f64)
    }

    fn clear(&mut self) {
        self.image.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
        self.pending = 0;
        self.visible = 0;
    }

    fn stroke_rect(&mut self, rect: &BoundingBox, style: &StrokeStyle) {
        self.pending += 1;
        let (img_w, img_h) = self.image.dimensions();
        if img_w == 0 || img_h == 0 || rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let color = Rgba(style.color);
        let lines = style.width.round().max(1.0) as i32;
        // centre the stroke on the rectangle outline
        for k in 0..lines {
            let inset = (k - lines / 2) as f64;
            if let Some(r) = pixel_rect(rect, inset, img_w, img_h) {
                draw_hollow_rect_mut(&mut self.image, r, color);
            }
        }
    }

    fn render(&mut self) {
        self.visible = self.pending;
        self.revision += 1;
    }

    fn rect_count(&self) -> usize {
        self.visible
    }
}

/// Integer rectangle `inset` pixels inside `bbox` (negative grows it),
/// clamped to the image. `None` when nothing of it lies on the image.
fn pixel_rect(bbox: &BoundingBox, inset: f64, img_w: u32, img_h: u32) -> Option<Rect> {
    let x1 = (bbox.x + inset).round();
    let y1 = (bbox.y + inset).round();
    let x2 = (bbox.right() - inset).round();
    let y2 = (bbox.bottom() - inset).round();
    if x2 <= x1 || y2 <= y1 || x2 <= 0.0 || y2 <= 0.0 {
        return None;
    }
    if x1 >= img_w as f64 || y1 >= img_h as f64 {
        return None;
    }

    let cx1 = x1.max(0.0);
    let cy1 = y1.max(0.0);
    let cx2 = x2.min(img_w as f64);
    let cy2 = y2.min(img_h as f64);
    Some(Rect::at(cx1 as i32, cy1 as i32).of_size((cx2 - cx1) as u32, (cy2 - cy1) as u32))
}
