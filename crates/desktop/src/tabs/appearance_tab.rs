use iced::widget::{checkbox, column, pick_list, row, slider, text, Space};
use iced::{Element, Theme};

use crate::app::{scaled, Message};
use crate::settings::{Appearance, Settings};
use crate::theme::muted_color;

pub fn view<'a>(settings: &Settings, theme: &Theme) -> Element<'a, Message> {
    let fs = settings.font_scale;

    column![
        text("Theme").size(scaled(16.0, fs)),
        Space::new().height(8),
        labeled(
            "Mode",
            fs,
            pick_list(Appearance::ALL, Some(settings.appearance), |a| {
                Message::AppearanceChanged(a)
            })
            .text_size(scaled(13.0, fs))
            .into(),
        ),
        Space::new().height(12),
        checkbox(settings.high_contrast)
            .label("High contrast")
            .on_toggle(Message::HighContrastChanged)
            .text_size(scaled(13.0, fs)),
        Space::new().height(20),
        text("Text size").size(scaled(16.0, fs)),
        Space::new().height(8),
        labeled(
            &format!("{:.0}%", settings.font_scale * 100.0),
            fs,
            slider(0.8..=1.5, settings.font_scale, Message::FontScaleChanged)
                .step(0.05)
                .into(),
        ),
        Space::new().height(8),
        text("Status lines and file names use this size too.")
            .size(scaled(12.0, fs))
            .color(muted_color(theme)),
    ]
    .spacing(0)
    .into()
}

fn labeled<'a>(label: &str, fs: f32, control: Element<'a, Message>) -> Element<'a, Message> {
    row![text(label.to_string()).size(scaled(13.0, fs)), control]
        .spacing(12)
        .align_y(iced::Alignment::Center)
        .into()
}
