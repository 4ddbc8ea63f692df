use iced::border::Border;
use iced::widget::{button, column, container, image, row, stack, text, Space};
use iced::{Color, ContentFit, Element, Font, Length, Theme};

use facemark_core::annotation::infrastructure::shape_list_surface::RectShape;
use facemark_core::shared::geometry::Size;

use crate::app::{scaled, Message};
use crate::theme::{muted_color, surface_color};
use crate::widgets::overlay_canvas::overlay_canvas;
use crate::widgets::primary_button::primary_button;

/// How the current boxes reach the screen.
#[derive(Clone, Copy)]
pub enum OverlayLayer<'a> {
    /// A transparent bitmap the size of the displayed video.
    Raster(Option<&'a image::Handle>),
    /// Rectangles stroked by the canvas.
    Shapes(&'a [RectShape]),
}

/// Everything drawn inside the video area.
pub struct Picture<'a> {
    pub frame: Option<&'a image::Handle>,
    pub overlay: OverlayLayer<'a>,
    pub native: Option<Size>,
    pub display: Option<Size>,
    pub face_detected: bool,
}

pub struct Transport<'a> {
    pub source_name: Option<String>,
    pub has_source: bool,
    pub playing: bool,
    pub status: Option<&'a str>,
    pub open_hovered: bool,
}

pub fn view<'a>(
    fs: f32,
    picture: Picture<'a>,
    transport: Transport<'a>,
    theme: &Theme,
) -> Element<'a, Message> {
    let muted = muted_color(theme);

    let open_btn = primary_button(
        "Open Video\u{2026}",
        scaled(14.0, fs),
        Message::OpenVideo,
        transport.open_hovered,
        Message::OpenHovered,
        [8, 20],
    );
    let source_label = text(
        transport
            .source_name
            .unwrap_or_else(|| "No video loaded".to_string()),
    )
    .size(scaled(13.0, fs))
    .color(muted);

    let header = row![open_btn, source_label]
        .spacing(12)
        .align_y(iced::Alignment::Center);

    let play_label = if transport.playing { "Pause" } else { "Play" };
    let play_btn = button(text(play_label).size(scaled(13.0, fs)))
        .on_press_maybe(transport.has_source.then_some(Message::TogglePlayPause))
        .padding([6, 18])
        .style(button::secondary);

    let face_flag: Element<'a, Message> = if picture.face_detected {
        text("Face Detected!")
            .size(scaled(14.0, fs))
            .font(Font {
                weight: iced::font::Weight::Bold,
                ..Font::DEFAULT
            })
            .color(theme.extended_palette().danger.base.color)
            .into()
    } else {
        Space::new().into()
    };

    let status: Element<'a, Message> = match transport.status {
        Some(message) => text(message).size(scaled(12.0, fs)).color(muted).into(),
        None => Space::new().into(),
    };

    let controls = row![
        play_btn,
        face_flag,
        Space::new().width(Length::Fill),
        status
    ]
    .spacing(16)
    .align_y(iced::Alignment::Center);

    column![header, video_area(fs, picture, muted), controls]
        .spacing(12)
        .height(Length::Fill)
        .into()
}

fn video_area<'a>(fs: f32, picture: Picture<'a>, muted: Color) -> Element<'a, Message> {
    let content: Element<'a, Message> = match picture.frame {
        Some(handle) => {
            let video = image(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill);

            let raster: Element<'a, Message> = match picture.overlay {
                OverlayLayer::Raster(Some(overlay)) => image(overlay.clone())
                    .content_fit(ContentFit::Contain)
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .into(),
                _ => Space::new().into(),
            };
            let shapes: &[RectShape] = match picture.overlay {
                OverlayLayer::Shapes(shapes) => shapes,
                OverlayLayer::Raster(_) => &[],
            };

            stack![
                video,
                raster,
                overlay_canvas(
                    picture.native,
                    picture.display,
                    shapes,
                    Message::OverlayResized
                ),
            ]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
        }
        None => container(
            text("Open a video to start")
                .size(scaled(14.0, fs))
                .color(muted),
        )
        .center(Length::Fill)
        .into(),
    };

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(|theme: &Theme| container::Style {
            background: Some(iced::Background::Color(surface_color(theme))),
            border: Border {
                radius: 8.0.into(),
                ..Border::default()
            },
            ..container::Style::default()
        })
        .into()
}
