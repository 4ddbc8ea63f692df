use std::path::PathBuf;

use crate::playback::domain::playback_state::PlaybackState;
use crate::playback::domain::video_source::VideoSource;

/// Instruction for whatever decodes and presents the video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Tear down any current decoder and open this source.
    Open(VideoSource),
    Play,
    Pause,
    /// Tear down the current decoder.
    Close,
}

/// Playback controller: owns the current source and play/pause state and
/// tells the decoder what to do.
#[derive(Debug, Default)]
pub struct VideoPlayer {
    state: PlaybackState,
    source: Option<VideoSource>,
    next_source_id: u64,
}

impl VideoPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn source(&self) -> Option<&VideoSource> {
        self.source.as_ref()
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Replaces the current source with `path` and starts playing it.
    pub fn load(&mut self, path: PathBuf) -> Vec<PlayerCommand> {
        self.next_source_id += 1;
        let source = VideoSource::new(self.next_source_id, path);
        log::info!("Loading source #{} ({})", source.id(), source.display_name());

        let mut commands = Vec::with_capacity(3);
        if self.source.is_some() {
            commands.push(PlayerCommand::Close);
        }
        commands.push(PlayerCommand::Open(source.clone()));
        commands.push(PlayerCommand::Play);

        self.source = Some(source);
        self.state = PlaybackState::Playing;
        commands
    }

    /// Flips play/pause. The flag flips even without a source, but a command
    /// is only issued when there is something to control.
    pub fn toggle(&mut self) -> Option<PlayerCommand> {
        self.state = self.state.toggled();
        self.source.as_ref()?;
        Some(match self.state {
            PlaybackState::Playing => PlayerCommand::Play,
            PlaybackState::Paused => PlayerCommand::Pause,
        })
    }

    /// The decoder reached end of stream.
    pub fn on_ended(&mut self) {
        self.state = PlaybackState::Paused;
    }

    /// Drops the current source, e.g. after it failed to decode.
    pub fn close(&mut self) -> Option<PlayerCommand> {
        self.state = PlaybackState::Paused;
        self.source.take().map(|_| PlayerCommand::Close)
    }
}
