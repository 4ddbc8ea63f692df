use iced::widget::{button, checkbox, column, pick_list, row, slider, text, Space};
use iced::{Element, Theme};

use facemark_core::detection::infrastructure::model_set::{ModelKind, ModelLoadState};

use crate::app::{scaled, Message};
use crate::settings::{OverlayBackend, ScalingMode, Settings, TIME_UPDATE_MAX_MS, TIME_UPDATE_MIN_MS};
use crate::theme::muted_color;

pub fn view<'a>(
    settings: &Settings,
    models: &[(ModelKind, Option<ModelLoadState>)],
    theme: &Theme,
) -> Element<'a, Message> {
    let fs = settings.font_scale;
    let muted = muted_color(theme);

    let overlay = column![
        text("Overlay").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Box placement").size(scaled(13.0, fs)),
            pick_list(ScalingMode::ALL, Some(settings.scaling_mode), |m| {
                Message::ScalingModeChanged(m)
            })
            .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(8),
        row![
            text("Drawing").size(scaled(13.0, fs)),
            pick_list(OverlayBackend::ALL, Some(settings.overlay_backend), |b| {
                Message::OverlayBackendChanged(b)
            })
            .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
    ];

    let detection = column![
        text("Detection").size(scaled(16.0, fs)),
        Space::new().height(8),
        text("Confidence").size(scaled(13.0, fs)),
        row![
            slider(10..=90, settings.confidence, Message::ConfidenceChanged),
            text(format!("{}%", settings.confidence)).size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(8),
        text("Update interval").size(scaled(13.0, fs)),
        row![
            slider(
                TIME_UPDATE_MIN_MS as u32..=TIME_UPDATE_MAX_MS as u32,
                settings.time_update_ms as u32,
                |ms| Message::TimeUpdateChanged(ms as u64)
            )
            .step(50u32),
            text(format!("{} ms", settings.time_update_ms)).size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(12),
        checkbox(settings.with_landmarks)
            .label("Detect facial landmarks")
            .on_toggle(Message::WithLandmarksChanged)
            .text_size(scaled(13.0, fs)),
        Space::new().height(8),
        checkbox(settings.with_descriptors)
            .label("Compute face descriptors")
            .on_toggle(Message::WithDescriptorsChanged)
            .text_size(scaled(13.0, fs)),
    ];

    let model_rows = models.iter().map(|(kind, state)| {
        let status = match state {
            None => "Not needed yet".to_string(),
            Some(ModelLoadState::Loading) => "Loading\u{2026}".to_string(),
            Some(ModelLoadState::Ready) => "Ready".to_string(),
            Some(ModelLoadState::Failed(reason)) => format!("Failed: {reason}"),
        };
        row![
            text(kind.label()).size(scaled(13.0, fs)),
            text(status).size(scaled(12.0, fs)).color(muted),
        ]
        .spacing(12)
        .into()
    });
    let model_list = column![text("Models").size(scaled(16.0, fs)), Space::new().height(8)]
        .extend(model_rows)
        .spacing(4);

    column![
        overlay,
        Space::new().height(20),
        detection,
        Space::new().height(20),
        model_list,
        Space::new().height(20),
        button(text("Restore Defaults").size(scaled(13.0, fs)))
            .on_press(Message::RestoreDefaults)
            .style(button::secondary),
    ]
    .spacing(0)
    .into()
}
