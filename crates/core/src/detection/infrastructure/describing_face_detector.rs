use crate::detection::domain::face_descriptor::DescriptorExtractor;
use crate::detection::domain::face_detection::FaceDetection;
use crate::detection::domain::face_detector::{DetectionError, DetectionOptions, FaceDetector};
use crate::shared::frame::Frame;

/// Decorator that attaches a descriptor to every face when the caller asks
/// for descriptors.
///
/// Without an extractor, a request with descriptors fails with
/// [`DetectionError::DescriptorUnavailable`] rather than silently returning
/// bare boxes.
pub struct DescribingFaceDetector {
    inner: Box<dyn FaceDetector>,
    extractor: Option<Box<dyn DescriptorExtractor>>,
}

impl DescribingFaceDetector {
    pub fn new(
        inner: Box<dyn FaceDetector>,
        extractor: Option<Box<dyn DescriptorExtractor>>,
    ) -> Self {
        Self { inner, extractor }
    }
}

impl FaceDetector for DescribingFaceDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        options: DetectionOptions,
    ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        let detections = self.inner.detect(frame, options)?;
        if !options.with_descriptors {
            return Ok(detections);
        }

        let extractor = self
            .extractor
            .as_mut()
            .ok_or(DetectionError::DescriptorUnavailable)?;
        detections
            .into_iter()
            .map(|det| -> Result<FaceDetection, Box<dyn std::error::Error>> {
                let descriptor = extractor.describe(frame, &det.bbox)?;
                Ok(det.with_descriptor(descriptor))
            })
            .collect()
    }
}
