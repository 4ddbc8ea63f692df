use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::{mouse, Color, Element, Length, Point, Rectangle, Renderer, Theme, Vector};

use facemark_core::annotation::infrastructure::shape_list_surface::RectShape;
use facemark_core::shared::geometry::Size;

/// Layout jitter below this many pixels is not reported as a resize.
const RESIZE_TOLERANCE: f64 = 0.5;

/// Transparent layer stacked over the video.
///
/// The video is drawn "contain"-fitted inside the same bounds, so this works
/// out the picture's on-screen size from the native size, reports it through
/// `on_resize` whenever it changes, and strokes `shapes` (in picture
/// coordinates) on top of it.
pub fn overlay_canvas<'a, Message: Clone + 'a>(
    native: Option<Size>,
    display: Option<Size>,
    shapes: &'a [RectShape],
    on_resize: fn(Size) -> Message,
) -> Element<'a, Message> {
    canvas::Canvas::new(OverlayCanvas {
        native,
        display,
        shapes,
        on_resize,
    })
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

struct OverlayCanvas<'a, Message> {
    native: Option<Size>,
    display: Option<Size>,
    shapes: &'a [RectShape],
    on_resize: fn(Size) -> Message,
}

impl<Message> OverlayCanvas<'_, Message> {
    fn fitted(&self, bounds: iced::Size) -> Option<Size> {
        let native = self.native?;
        let fitted = native.fit_within(Size::new(bounds.width as f64, bounds.height as f64));
        (!fitted.is_empty()).then_some(fitted)
    }
}

impl<Message: Clone> canvas::Program<Message> for OverlayCanvas<'_, Message> {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        _event: &canvas::Event,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let fitted = self.fitted(bounds.size())?;
        resize_needed(self.display, fitted)
            .then(|| canvas::Action::publish((self.on_resize)(fitted)))
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let Some(fitted) = self.fitted(bounds.size()) else {
            return vec![frame.into_geometry()];
        };

        let origin = Vector::new(
            ((bounds.width as f64 - fitted.width) / 2.0) as f32,
            ((bounds.height as f64 - fitted.height) / 2.0) as f32,
        );
        for shape in self.shapes {
            let b = &shape.bounds;
            let path = Path::rectangle(
                Point::new(b.x as f32, b.y as f32) + origin,
                iced::Size::new(b.width as f32, b.height as f32),
            );
            let [r, g, bl, a] = shape.style.color;
            frame.stroke(
                &path,
                Stroke::default()
                    .with_color(Color::from_rgba8(r, g, bl, a as f32 / 255.0))
                    .with_width(shape.style.width),
            );
        }
        vec![frame.into_geometry()]
    }
}

fn resize_needed(known: Option<Size>, fitted: Size) -> bool {
    match known {
        None => true,
        Some(k) => {
            (k.width - fitted.width).abs() > RESIZE_TOLERANCE
                || (k.height - fitted.height).abs() > RESIZE_TOLERANCE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(None, Size::new(640.0, 360.0), true)]
    #[case(Some(Size::new(640.0, 360.0)), Size::new(640.0, 360.0), false)]
    #[case(Some(Size::new(640.0, 360.0)), Size::new(640.3, 360.2), false)]
    #[case(Some(Size::new(640.0, 360.0)), Size::new(800.0, 450.0), true)]
    fn test_resize_needed(#[case] known: Option<Size>, #[case] fitted: Size, #[case] expected: bool) {
        assert_eq!(resize_needed(known, fitted), expected);
    }

    fn program(native: Option<Size>) -> OverlayCanvas<'static, Size> {
        OverlayCanvas {
            native,
            display: None,
            shapes: &[],
            on_resize: |s| s,
        }
    }

    #[test]
    fn test_fitted_letterboxes_wide_video() {
        let fitted = program(Some(Size::new(1920.0, 1080.0)))
            .fitted(iced::Size::new(800.0, 600.0))
            .unwrap();
        assert_relative_eq!(fitted.width, 800.0);
        assert_relative_eq!(fitted.height, 450.0);
    }

    #[test]
    fn test_fitted_needs_a_source() {
        assert!(program(None).fitted(iced::Size::new(800.0, 600.0)).is_none());
        assert!(program(Some(Size::new(640.0, 480.0)))
            .fitted(iced::Size::new(0.0, 0.0))
            .is_none());
    }
}
