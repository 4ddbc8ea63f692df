use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use facemark_core::shared::frame::Frame;
use facemark_core::shared::video_metadata::VideoMetadata;
use facemark_core::video::domain::video_reader::VideoReader;
use facemark_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// Decoded frames buffered ahead of the UI.
const FRAME_BUFFER: usize = 4;

pub enum PlaybackMessage {
    Opened(VideoMetadata),
    Frame(Arc<Frame>),
    Ended,
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackControl {
    Play,
    Pause,
    Stop,
}

/// Owning end of a decoder thread. Dropping it stops the thread.
pub struct PlaybackHandle {
    controls: Sender<PlaybackControl>,
    cancelled: Arc<AtomicBool>,
}

impl PlaybackHandle {
    pub fn send(&self, control: PlaybackControl) {
        if self.controls.send(control).is_err() {
            log::debug!("Playback worker has exited; {control:?} dropped");
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        let _ = self.controls.send(PlaybackControl::Stop);
    }
}

/// Opens `path` on a decoder thread. The worker starts paused and waits for
/// [`PlaybackControl::Play`].
pub fn spawn(path: PathBuf) -> (PlaybackHandle, Receiver<PlaybackMessage>) {
    let (tx, rx) = crossbeam_channel::bounded::<PlaybackMessage>(FRAME_BUFFER);
    let (ctl_tx, ctl_rx) = crossbeam_channel::unbounded::<PlaybackControl>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    thread::spawn(move || {
        let mut reader = FfmpegReader::new();
        if let Err(e) = run_playback(&mut reader, &path, &ctl_rx, &tx, &cancelled_clone) {
            if !cancelled_clone.load(Ordering::Relaxed) {
                log::warn!("Playback of {} failed: {e}", path.display());
                let _ = tx.send(PlaybackMessage::Error(e.to_string()));
            }
        }
        reader.close();
        log::debug!("Playback worker for {} stopped", path.display());
    });

    (
        PlaybackHandle {
            controls: ctl_tx,
            cancelled,
        },
        rx,
    )
}

/// Whether the decoder should keep going after handling controls.
enum Flow {
    Continue,
    Stop,
}

struct Transport<'a> {
    controls: &'a Receiver<PlaybackControl>,
    playing: bool,
    pacer: Pacer,
}

impl Transport<'_> {
    fn apply(&mut self, control: PlaybackControl) -> Flow {
        match control {
            PlaybackControl::Play => {
                if !self.playing {
                    self.pacer.reanchor();
                }
                self.playing = true;
            }
            PlaybackControl::Pause => self.playing = false,
            PlaybackControl::Stop => return Flow::Stop,
        }
        Flow::Continue
    }

    /// Blocks while paused.
    fn wait_until_playing(&mut self) -> Flow {
        while !self.playing {
            match self.controls.recv() {
                Ok(control) => {
                    if let Flow::Stop = self.apply(control) {
                        return Flow::Stop;
                    }
                }
                Err(_) => return Flow::Stop,
            }
        }
        Flow::Continue
    }

    /// Sleeps until the frame at `timestamp` is due, staying responsive to
    /// controls. A pause in the middle holds the frame until play resumes.
    fn wait_until_due(&mut self, timestamp: f64) -> Flow {
        loop {
            if let Flow::Stop = self.wait_until_playing() {
                return Flow::Stop;
            }
            let wait = self.pacer.wait_for(timestamp, Instant::now());
            if wait.is_zero() {
                return Flow::Continue;
            }
            match self.controls.recv_timeout(wait) {
                Ok(control) => {
                    if let Flow::Stop = self.apply(control) {
                        return Flow::Stop;
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Flow::Continue,
                Err(RecvTimeoutError::Disconnected) => return Flow::Stop,
            }
        }
    }
}

fn run_playback(
    reader: &mut FfmpegReader,
    path: &Path,
    controls: &Receiver<PlaybackControl>,
    tx: &Sender<PlaybackMessage>,
    cancelled: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = reader.open(path)?;
    if tx.send(PlaybackMessage::Opened(metadata)).is_err() {
        return Ok(());
    }

    let mut transport = Transport {
        controls,
        playing: false,
        pacer: Pacer::default(),
    };

    loop {
        for frame in reader.frames() {
            let frame = frame?;
            if let Flow::Stop = transport.wait_until_due(frame.timestamp()) {
                return Ok(());
            }
            if cancelled.load(Ordering::Relaxed) {
                return Ok(());
            }
            if tx.send(PlaybackMessage::Frame(Arc::new(frame))).is_err() {
                return Ok(());
            }
        }

        log::debug!("Reached end of {}", path.display());
        if tx.send(PlaybackMessage::Ended).is_err() {
            return Ok(());
        }
        transport.playing = false;

        // Playing again after the end restarts from the first frame.
        if let Flow::Stop = transport.wait_until_playing() {
            return Ok(());
        }
        reader.close();
        reader.open(path)?;
        transport.pacer.reanchor();
    }
}

/// Maps presentation timestamps onto the wall clock.
///
/// The first frame after (re)anchoring is due immediately; later frames are
/// due when as much wall time has passed as media time.
#[derive(Debug, Default)]
struct Pacer {
    anchor: Option<(Instant, f64)>,
}

impl Pacer {
    fn reanchor(&mut self) {
        self.anchor = None;
    }

    /// Time left until `timestamp` is due at `now`.
    fn wait_for(&mut self, timestamp: f64, now: Instant) -> Duration {
        match self.anchor {
            None => {
                self.anchor = Some((now, timestamp));
                Duration::ZERO
            }
            Some((start, base)) => {
                let offset = Duration::from_secs_f64((timestamp - base).max(0.0));
                (start + offset).saturating_duration_since(now)
            }
        }
    }
}
