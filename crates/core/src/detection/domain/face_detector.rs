use thiserror::Error;

use crate::detection::domain::face_detection::FaceDetection;
use crate::shared::frame::Frame;

/// What a detection call should compute beyond bounding boxes.
///
/// Both extras default to off: the overlay only draws boxes, and
/// descriptors cost one extra inference per face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectionOptions {
    pub with_landmarks: bool,
    pub with_descriptors: bool,
}

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("face descriptors requested but no descriptor model is loaded")]
    DescriptorUnavailable,
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
}

/// Domain interface for face detection.
///
/// Boxes are reported in the frame's native pixel coordinates. Implementations
/// hold inference sessions that need exclusive access, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        options: DetectionOptions,
    ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>>;
}
