use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use iced::widget::{button, column, container, image, row, scrollable, text};
use iced::{Element, Length, Subscription, Task, Theme};

use facemark_core::annotation::domain::annotation_overlay::{AnnotationOverlay, ApplyOutcome};
use facemark_core::annotation::domain::box_scaler;
use facemark_core::annotation::infrastructure::raster_surface::RasterSurface;
use facemark_core::annotation::infrastructure::shape_list_surface::ShapeListSurface;
use facemark_core::detection::domain::face_detection::DetectionResult;
use facemark_core::detection::infrastructure::model_set::{ModelKind, ModelLoadState};
use facemark_core::playback::domain::time_update_clock::TimeUpdateClock;
use facemark_core::playback::domain::video_player::{PlayerCommand, VideoPlayer};
use facemark_core::shared::constants::{MODEL_WEIGHTS_DIR, VIDEO_EXTENSIONS};
use facemark_core::shared::frame::Frame;
use facemark_core::shared::geometry::Size;

use crate::settings::{Appearance, OverlayBackend, ScalingMode, Settings};
use crate::tabs;
use crate::tabs::player_tab::{OverlayLayer, Picture, Transport};
use crate::theme;
use crate::workers::detection_worker::{
    self, DetectionHandle, DetectionMessage, DetectionParams, DetectionRequest,
};
use crate::workers::model_cache::ModelCache;
use crate::workers::playback_worker::{self, PlaybackControl, PlaybackHandle, PlaybackMessage};

/// Worker polling rate; comfortably above common video frame rates.
const POLL_INTERVAL: Duration = Duration::from_millis(15);

/// Detector settings must hold still this long before sessions are rebuilt,
/// so dragging the confidence slider rebuilds once.
const DETECTOR_REBUILD_DELAY: Duration = Duration::from_millis(400);

const DOWNLOAD_STATUS: &str = "Downloading face models\u{2026}";

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Player,
    Settings,
    Appearance,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Player, Tab::Settings, Tab::Appearance];

    fn label(self) -> &'static str {
        match self {
            Tab::Player => "Player",
            Tab::Settings => "Settings",
            Tab::Appearance => "Appearance",
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    OpenVideo,
    VideoSelected(Option<PathBuf>),
    OpenHovered(bool),
    TogglePlayPause,
    OverlayResized(Size),
    Tick,
    ScalingModeChanged(ScalingMode),
    OverlayBackendChanged(OverlayBackend),
    ConfidenceChanged(u32),
    TimeUpdateChanged(u64),
    WithLandmarksChanged(bool),
    WithDescriptorsChanged(bool),
    RestoreDefaults,
    AppearanceChanged(Appearance),
    HighContrastChanged(bool),
    FontScaleChanged(f32),
    PollSystemTheme,
}

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

/// The annotation overlay on whichever surface the settings pick.
enum Overlay {
    Raster(AnnotationOverlay<RasterSurface>),
    Shapes(AnnotationOverlay<ShapeListSurface>),
}

impl Overlay {
    fn new(backend: OverlayBackend, scaling: ScalingMode) -> Self {
        match backend {
            OverlayBackend::Raster => {
                Overlay::Raster(AnnotationOverlay::new(RasterSurface::new(), scaling.into()))
            }
            OverlayBackend::Shapes => {
                Overlay::Shapes(AnnotationOverlay::new(ShapeListSurface::new(), scaling.into()))
            }
        }
    }

    fn switch_to(self, backend: OverlayBackend) -> Self {
        match (self, backend) {
            (Overlay::Raster(o), OverlayBackend::Shapes) => {
                Overlay::Shapes(o.with_surface(ShapeListSurface::new()))
            }
            (Overlay::Shapes(o), OverlayBackend::Raster) => {
                Overlay::Raster(o.with_surface(RasterSurface::new()))
            }
            (same, _) => same,
        }
    }

    fn face_detected(&self) -> bool {
        match self {
            Overlay::Raster(o) => o.face_detected(),
            Overlay::Shapes(o) => o.face_detected(),
        }
    }

    fn display_size(&self) -> Option<Size> {
        match self {
            Overlay::Raster(o) => o.display_size(),
            Overlay::Shapes(o) => o.display_size(),
        }
    }

    fn set_display_size(&mut self, size: Size) {
        match self {
            Overlay::Raster(o) => o.set_display_size(size),
            Overlay::Shapes(o) => o.set_display_size(size),
        }
    }

    fn set_scaling_mode(&mut self, mode: box_scaler::ScalingMode) {
        match self {
            Overlay::Raster(o) => o.set_scaling_mode(mode),
            Overlay::Shapes(o) => o.set_scaling_mode(mode),
        }
    }

    fn begin_source(&mut self, native: Size) {
        match self {
            Overlay::Raster(o) => o.begin_source(native),
            Overlay::Shapes(o) => o.begin_source(native),
        }
    }

    fn end_source(&mut self) {
        match self {
            Overlay::Raster(o) => o.end_source(),
            Overlay::Shapes(o) => o.end_source(),
        }
    }

    fn request_detection(&mut self) -> Option<u64> {
        match self {
            Overlay::Raster(o) => o.request_detection(),
            Overlay::Shapes(o) => o.request_detection(),
        }
    }

    fn resume_deferred(&mut self) -> Option<u64> {
        match self {
            Overlay::Raster(o) => o.resume_deferred(),
            Overlay::Shapes(o) => o.resume_deferred(),
        }
    }

    fn apply(&mut self, result: &DetectionResult) -> ApplyOutcome {
        match self {
            Overlay::Raster(o) => o.apply(result),
            Overlay::Shapes(o) => o.apply(result),
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    active_tab: Tab,
    pub settings: Settings,
    player: VideoPlayer,
    clock: TimeUpdateClock,
    overlay: Overlay,
    native_size: Option<Size>,
    frame: Option<Arc<Frame>>,
    frame_handle: Option<image::Handle>,
    overlay_handle: Option<image::Handle>,
    overlay_revision: u64,
    status: Option<String>,
    open_hovered: bool,
    model_cache: Arc<ModelCache>,
    model_state: ModelLoadState,
    awaiting_detection: bool,
    rebuild_detector_at: Option<Instant>,
    playback: Option<(PlaybackHandle, Receiver<PlaybackMessage>)>,
    detection: Option<(DetectionHandle, Receiver<DetectionMessage>)>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let mut app = Self {
            active_tab: Tab::Player,
            player: VideoPlayer::new(),
            clock: TimeUpdateClock::new(settings.time_update_interval()),
            overlay: Overlay::new(settings.overlay_backend, settings.scaling_mode),
            native_size: None,
            frame: None,
            frame_handle: None,
            overlay_handle: None,
            overlay_revision: 0,
            status: None,
            open_hovered: false,
            model_cache: ModelCache::new(PathBuf::from(MODEL_WEIGHTS_DIR)),
            model_state: ModelLoadState::Loading,
            awaiting_detection: false,
            rebuild_detector_at: None,
            playback: None,
            detection: None,
            settings,
        };
        app.spawn_detection();
        (app, Task::none())
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
            }
            Message::OpenVideo => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Open video")
                            .add_filter("Video Files", VIDEO_EXTENSIONS)
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::VideoSelected,
                );
            }
            Message::VideoSelected(Some(path)) => {
                let commands = self.player.load(path);
                self.run_commands(commands);
            }
            Message::VideoSelected(None) => {}
            Message::OpenHovered(hovered) => {
                self.open_hovered = hovered;
            }
            Message::TogglePlayPause => {
                if let Some(command) = self.player.toggle() {
                    self.run_commands(vec![command]);
                }
            }
            Message::OverlayResized(size) => {
                log::debug!("Overlay resized to {:.0}x{:.0}", size.width, size.height);
                self.overlay.set_display_size(size);
                if let Some(generation) = self.overlay.resume_deferred() {
                    self.send_request(generation);
                }
            }
            Message::Tick => {
                self.poll_playback();
                self.poll_detection();
                if self
                    .rebuild_detector_at
                    .is_some_and(|at| Instant::now() >= at)
                {
                    self.spawn_detection();
                }
            }
            Message::ScalingModeChanged(mode) => {
                self.settings.scaling_mode = mode;
                self.overlay.set_scaling_mode(mode.into());
                self.settings.save();
            }
            Message::OverlayBackendChanged(backend) => {
                self.settings.overlay_backend = backend;
                self.switch_overlay(backend);
                self.settings.save();
            }
            Message::ConfidenceChanged(val) => {
                self.settings.confidence = val;
                self.schedule_detector_rebuild();
                self.settings.save();
            }
            Message::TimeUpdateChanged(ms) => {
                self.settings.time_update_ms = ms;
                self.clock.set_interval(self.settings.time_update_interval());
                self.settings.save();
            }
            Message::WithLandmarksChanged(enabled) => {
                self.settings.with_landmarks = enabled;
                self.settings.save();
            }
            Message::WithDescriptorsChanged(enabled) => {
                self.settings.with_descriptors = enabled;
                self.schedule_detector_rebuild();
                self.settings.save();
            }
            Message::RestoreDefaults => {
                let defaults = Settings::default();
                let rebuild = self.settings.confidence != defaults.confidence
                    || self.settings.with_descriptors != defaults.with_descriptors;

                self.settings.scaling_mode = defaults.scaling_mode;
                self.settings.overlay_backend = defaults.overlay_backend;
                self.settings.confidence = defaults.confidence;
                self.settings.time_update_ms = defaults.time_update_ms;
                self.settings.with_landmarks = defaults.with_landmarks;
                self.settings.with_descriptors = defaults.with_descriptors;

                self.overlay.set_scaling_mode(defaults.scaling_mode.into());
                self.switch_overlay(defaults.overlay_backend);
                self.clock.set_interval(self.settings.time_update_interval());
                if rebuild {
                    self.schedule_detector_rebuild();
                }
                self.settings.save();
            }
            Message::AppearanceChanged(appearance) => {
                self.settings.appearance = appearance;
                self.settings.save();
            }
            Message::HighContrastChanged(enabled) => {
                self.settings.high_contrast = enabled;
                self.settings.save();
            }
            Message::FontScaleChanged(scale) => {
                self.settings.font_scale = scale;
                self.settings.save();
            }
            Message::PollSystemTheme => {
                // Theme is resolved fresh in theme() on every render,
                // so just requesting a redraw is enough.
            }
        }
        Task::none()
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    fn run_commands(&mut self, commands: Vec<PlayerCommand>) {
        for command in commands {
            match command {
                PlayerCommand::Close => {
                    self.playback = None;
                    self.clear_picture();
                }
                PlayerCommand::Open(source) => {
                    self.clear_picture();
                    self.status = None;
                    self.playback = Some(playback_worker::spawn(source.path().to_path_buf()));
                }
                PlayerCommand::Play => self.send_control(PlaybackControl::Play),
                PlayerCommand::Pause => self.send_control(PlaybackControl::Pause),
            }
        }
    }

    fn send_control(&self, control: PlaybackControl) {
        if let Some((handle, _)) = &self.playback {
            handle.send(control);
        }
    }

    fn clear_picture(&mut self) {
        self.frame = None;
        self.frame_handle = None;
        self.native_size = None;
        self.clock.reset();
        self.overlay.end_source();
        self.refresh_overlay_image();
    }

    fn poll_playback(&mut self) {
        let messages: Vec<PlaybackMessage> = match &self.playback {
            Some((_, rx)) => rx.try_iter().collect(),
            None => return,
        };
        for message in messages {
            match message {
                PlaybackMessage::Opened(metadata) => {
                    let native = metadata.native_size();
                    self.native_size = Some(native);
                    self.overlay.begin_source(native);
                    self.clock.reset();
                    self.refresh_overlay_image();
                }
                PlaybackMessage::Frame(frame) => self.present(frame),
                PlaybackMessage::Ended => {
                    log::info!("Playback reached the end");
                    self.player.on_ended();
                }
                PlaybackMessage::Error(e) => {
                    self.status = Some(format!("Could not play video: {e}"));
                    if let Some(command) = self.player.close() {
                        self.run_commands(vec![command]);
                    }
                }
            }
        }
    }

    fn present(&mut self, frame: Arc<Frame>) {
        self.frame_handle = Some(image::Handle::from_rgba(
            frame.width(),
            frame.height(),
            frame.to_rgba(),
        ));
        let update = self.clock.on_frame(frame.timestamp());
        self.frame = Some(frame);
        if let Some(update) = update {
            log::trace!("Time update {update:?}");
            self.request_detection();
        }
    }

    // -----------------------------------------------------------------------
    // Detection
    // -----------------------------------------------------------------------

    fn spawn_detection(&mut self) {
        self.rebuild_detector_at = None;
        self.awaiting_detection = false;
        self.model_state = ModelLoadState::Loading;
        self.detection = Some(detection_worker::spawn(DetectionParams {
            confidence: self.settings.confidence_threshold(),
            with_descriptors: self.settings.with_descriptors,
            model_cache: self.model_cache.clone(),
        }));
    }

    fn schedule_detector_rebuild(&mut self) {
        self.rebuild_detector_at = Some(Instant::now() + DETECTOR_REBUILD_DELAY);
    }

    fn request_detection(&mut self) {
        if self.detection.is_none() || self.frame.is_none() {
            return;
        }
        if let Some(generation) = self.overlay.request_detection() {
            self.send_request(generation);
        }
    }

    /// Sends the current frame to the detection worker under `generation`.
    fn send_request(&mut self, generation: u64) {
        let (Some((handle, _)), Some(frame)) = (&self.detection, &self.frame) else {
            return;
        };
        handle.request(DetectionRequest {
            generation,
            frame: frame.clone(),
            options: self.settings.detection_options(),
        });
        self.awaiting_detection = true;
    }

    fn poll_detection(&mut self) {
        let messages: Vec<DetectionMessage> = match &self.detection {
            Some((_, rx)) => rx.try_iter().collect(),
            None => return,
        };
        for message in messages {
            match message {
                DetectionMessage::DownloadProgress(downloaded, total) => {
                    let pct = downloaded * 100 / total.max(1);
                    self.status = Some(format!("{DOWNLOAD_STATUS} {pct}%"));
                }
                DetectionMessage::Ready => {
                    self.model_state = ModelLoadState::Ready;
                    if self
                        .status
                        .as_deref()
                        .is_some_and(|s| s.starts_with(DOWNLOAD_STATUS))
                    {
                        self.status = None;
                    }
                }
                DetectionMessage::Result(result) => {
                    self.awaiting_detection = false;
                    if let ApplyOutcome::Drawn(n) = self.overlay.apply(&result) {
                        log::debug!("Drew {n} face boxes for request {}", result.generation);
                        self.refresh_overlay_image();
                    }
                }
                DetectionMessage::Error(e) => {
                    self.awaiting_detection = false;
                    self.status = Some(format!("Detection failed: {e}"));
                }
                DetectionMessage::Failed(e) => {
                    self.model_state = ModelLoadState::Failed(e.clone());
                    self.status = Some(format!("Face detection unavailable: {e}"));
                    self.awaiting_detection = false;
                    self.detection = None;
                    return;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Overlay
    // -----------------------------------------------------------------------

    fn switch_overlay(&mut self, backend: OverlayBackend) {
        let current = std::mem::replace(
            &mut self.overlay,
            Overlay::new(backend, self.settings.scaling_mode),
        );
        self.overlay = current.switch_to(backend);
        self.refresh_overlay_image();
    }

    /// Re-uploads the raster overlay when it changed since the last upload.
    fn refresh_overlay_image(&mut self) {
        let Overlay::Raster(overlay) = &self.overlay else {
            self.overlay_handle = None;
            return;
        };
        let surface = overlay.surface();
        if self.overlay_handle.is_some() && surface.revision() == self.overlay_revision {
            return;
        }
        self.overlay_revision = surface.revision();
        let (w, h) = surface.image().dimensions();
        self.overlay_handle = (w > 0 && h > 0)
            .then(|| image::Handle::from_rgba(w, h, surface.image().as_raw().clone()));
    }

    fn needs_polling(&self) -> bool {
        let playing = self.playback.is_some() && self.player.state().is_playing();
        let loading = self.detection.is_some() && self.model_state == ModelLoadState::Loading;
        playing || loading || self.awaiting_detection || self.rebuild_detector_at.is_some()
    }

    // -----------------------------------------------------------------------
    // View
    // -----------------------------------------------------------------------

    pub fn view(&self) -> Element<'_, Message> {
        let fs = self.settings.font_scale;
        let theme = self.theme();

        // Tab bar
        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let label = text(tab.label()).size(scaled(13.0, fs));
                let btn = button(label)
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        // Tab content
        let content: Element<'_, Message> = match self.active_tab {
            Tab::Player => tabs::player_tab::view(fs, self.picture(), self.transport(), &theme),
            Tab::Settings => scrollable(tabs::settings_tab::view(
                &self.settings,
                &self.model_states(),
                &theme,
            ))
            .height(Length::Fill)
            .into(),
            Tab::Appearance => {
                scrollable(tabs::appearance_tab::view(&self.settings, &theme))
                    .height(Length::Fill)
                    .into()
            }
        };

        let tab_content = container(content).padding(16).height(Length::Fill);

        column![tab_bar, tab_content]
            .spacing(0)
            .height(Length::Fill)
            .into()
    }

    fn picture(&self) -> Picture<'_> {
        let overlay = match &self.overlay {
            Overlay::Raster(_) => OverlayLayer::Raster(self.overlay_handle.as_ref()),
            Overlay::Shapes(o) => OverlayLayer::Shapes(o.surface().shapes()),
        };
        Picture {
            frame: self.frame_handle.as_ref(),
            overlay,
            native: self.native_size,
            display: self.overlay.display_size(),
            face_detected: self.overlay.face_detected(),
        }
    }

    fn transport(&self) -> Transport<'_> {
        Transport {
            source_name: self.player.source().map(|s| s.display_name()),
            has_source: self.player.has_source(),
            playing: self.player.state().is_playing(),
            status: self.status.as_deref(),
            open_hovered: self.open_hovered,
        }
    }

    /// Resolution state per model, with the detector reflecting session
    /// construction as well as the file lookup. `None` for a model not
    /// needed so far.
    fn model_states(&self) -> Vec<(ModelKind, Option<ModelLoadState>)> {
        ModelKind::ALL
            .iter()
            .map(|&kind| {
                let state = match (kind, self.model_cache.state(kind)) {
                    (ModelKind::FaceDetector, Some(ModelLoadState::Ready)) => {
                        Some(self.model_state.clone())
                    }
                    (_, state) => state,
                };
                (kind, state)
            })
            .collect()
    }

    pub fn theme(&self) -> Theme {
        theme::resolve_theme(self.settings.appearance, self.settings.high_contrast)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let system_theme = if self.settings.appearance == Appearance::System {
            iced::time::every(Duration::from_secs(2)).map(|_| Message::PollSystemTheme)
        } else {
            Subscription::none()
        };
        let workers = if self.needs_polling() {
            iced::time::every(POLL_INTERVAL).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };
        Subscription::batch([system_theme, workers])
    }
}

/// Scale a base font size by the user's font_scale setting.
pub fn scaled(base: f32, font_scale: f32) -> f32 {
    (base * font_scale).round()
}
