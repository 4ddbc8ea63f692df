use std::path::PathBuf;

use crate::shared::geometry::Size;

/// Stream properties known once a source has been opened.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Clockwise rotation (0, 90, 180 or 270) the container asks for on display.
    pub rotation: i32,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Intrinsic resolution in display orientation, independent of how large
    /// the video is displayed. Quarter-turn rotations swap the coded sides.
    pub fn native_size(&self) -> Size {
        if self.rotation % 180 == 0 {
            Size::new(self.width as f64, self.height as f64)
        } else {
            Size::new(self.height as f64, self.width as f64)
        }
    }

    /// Seconds per frame, or `None` when the container reports no rate.
    pub fn frame_interval(&self) -> Option<f64> {
        (self.fps > 0.0).then(|| 1.0 / self.fps)
    }
}
