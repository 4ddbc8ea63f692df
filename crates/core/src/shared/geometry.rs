/// Width and height in pixels.
///
/// Floating point because displayed sizes come out of layout and are rarely
/// whole numbers; native video sizes convert losslessly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero, negative, or NaN.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Largest size with this aspect ratio that fits inside `bounds`, i.e.
    /// where a "contain" layout puts the picture.
    pub fn fit_within(&self, bounds: Size) -> Size {
        if self.is_empty() || bounds.is_empty() {
            return Size::new(0.0, 0.0);
        }
        let scale = (bounds.width / self.width).min(bounds.height / self.height);
        Size::new(self.width * scale, self.height * scale)
    }
}

/// Axis-aligned rectangle `(x, y, width, height)` in pixel coordinates.
///
/// Which pixel space (native video or displayed surface) depends on the
/// producer; detectors always emit native-space boxes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.right().min(other.right());
        let iy2 = self.bottom().min(other.bottom());

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Intersects the box with `[0, bounds.width] x [0, bounds.height]`.
    ///
    /// A box entirely outside the bounds collapses to zero size.
    pub fn clamp_to(&self, bounds: Size) -> BoundingBox {
        let x1 = self.x.clamp(0.0, bounds.width);
        let y1 = self.y.clamp(0.0, bounds.height);
        let x2 = self.right().clamp(0.0, bounds.width);
        let y2 = self.bottom().clamp(0.0, bounds.height);
        BoundingBox::from_corners(x1, y1, x2.max(x1), y2.max(y1))
    }
}
