use crate::detection::domain::face_descriptor::FaceDescriptor;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::geometry::{BoundingBox, Size};

/// One detected face in native video pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceDetection {
    pub bbox: BoundingBox,
    pub score: f64,
    pub landmarks: Option<FaceLandmarks>,
    pub descriptor: Option<FaceDescriptor>,
}

impl FaceDetection {
    pub fn new(bbox: BoundingBox, score: f64) -> Self {
        Self {
            bbox,
            score,
            landmarks: None,
            descriptor: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn with_descriptor(mut self, descriptor: FaceDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }
}

/// Detections for one requested frame.
///
/// `generation` identifies the request; `native_size` is the frame's
/// decoded resolution the boxes are expressed in.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionResult {
    pub generation: u64,
    pub native_size: Size,
    pub detections: Vec<FaceDetection>,
}
