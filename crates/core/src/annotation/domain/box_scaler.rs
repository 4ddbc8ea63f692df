use crate::shared::geometry::{BoundingBox, Size};

/// How native-resolution boxes map onto the displayed surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScalingMode {
    /// Native coordinates drawn as-is. Misaligned whenever the video is
    /// displayed at anything other than its native size.
    Unscaled,
    /// Each axis scaled by displayed / native size.
    #[default]
    Proportional,
}

/// Maps `bbox` from native video pixels onto a surface of size `surface`.
///
/// Proportional scaling computes `(x·CW/VW, y·CH/VH, w·CW/VW, h·CH/VH)`.
/// An empty native size cannot be scaled from, so the box is returned as-is.
pub fn scale_box(bbox: &BoundingBox, native: Size, surface: Size, mode: ScalingMode) -> BoundingBox {
    match mode {
        ScalingMode::Unscaled => *bbox,
        ScalingMode::Proportional if native.is_empty() => *bbox,
        ScalingMode::Proportional => BoundingBox::new(
            bbox.x * surface.width / native.width,
            bbox.y * surface.height / native.height,
            bbox.width * surface.width / native.width,
            bbox.height * surface.height / native.height,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_default_is_proportional() {
        assert_eq!(ScalingMode::default(), ScalingMode::Proportional);
    }

    #[rstest]
    #[case::downscale(Size::new(1920.0, 1080.0), Size::new(640.0, 360.0))]
    #[case::upscale(Size::new(320.0, 240.0), Size::new(1280.0, 960.0))]
    #[case::anamorphic(Size::new(1000.0, 1000.0), Size::new(500.0, 250.0))]
    #[case::fractional(Size::new(1280.0, 720.0), Size::new(853.5, 480.25))]
    fn test_proportional_matches_formula(#[case] native: Size, #[case] surface: Size) {
        let b = BoundingBox::new(100.0, 50.0, 200.0, 120.0);
        let s = scale_box(&b, native, surface, ScalingMode::Proportional);

        assert_eq!(s.x, b.x * surface.width / native.width);
        assert_eq!(s.y, b.y * surface.height / native.height);
        assert_eq!(s.width, b.width * surface.width / native.width);
        assert_eq!(s.height, b.height * surface.height / native.height);
        assert_relative_eq!(s.right(), b.right() * surface.width / native.width, epsilon = 1e-9);
    }

    #[test]
    fn test_proportional_half_size() {
        let b = BoundingBox::new(100.0, 200.0, 50.0, 60.0);
        let s = scale_box(
            &b,
            Size::new(1280.0, 720.0),
            Size::new(640.0, 360.0),
            ScalingMode::Proportional,
        );
        assert_eq!(s, BoundingBox::new(50.0, 100.0, 25.0, 30.0));
    }

    #[test]
    fn test_unscaled_is_identity() {
        let b = BoundingBox::new(100.0, 200.0, 50.0, 60.0);
        let s = scale_box(
            &b,
            Size::new(1280.0, 720.0),
            Size::new(640.0, 360.0),
            ScalingMode::Unscaled,
        );
        assert_eq!(s, b);
    }

    #[test]
    fn test_same_size_is_identity_in_both_modes() {
        let b = BoundingBox::new(1.5, 2.5, 3.5, 4.5);
        let size = Size::new(640.0, 480.0);
        assert_eq!(scale_box(&b, size, size, ScalingMode::Proportional), b);
        assert_eq!(scale_box(&b, size, size, ScalingMode::Unscaled), b);
    }

    #[test]
    fn test_empty_native_size_passes_through() {
        let b = BoundingBox::new(10.0, 10.0, 10.0, 10.0);
        let s = scale_box(
            &b,
            Size::new(0.0, 0.0),
            Size::new(640.0, 360.0),
            ScalingMode::Proportional,
        );
        assert_eq!(s, b);
    }
}
