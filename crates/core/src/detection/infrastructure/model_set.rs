//! The fixed set of pretrained models the overlay loads at startup.

use std::path::{Path, PathBuf};

use crate::detection::domain::face_descriptor::DescriptorExtractor;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::{
    FACE_DESCRIPTOR_MODEL_NAME, FACE_DESCRIPTOR_MODEL_URL, FACE_DETECTOR_MODEL_NAME,
    FACE_DETECTOR_MODEL_URL,
};
use crate::shared::model_resolver::{self, ModelResolveError, ProgressFn};

use super::describing_face_detector::DescribingFaceDetector;
use super::onnx_descriptor_extractor::OnnxDescriptorExtractor;
use super::onnx_yolo_detector::OnnxYoloDetector;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// YOLO face model with a five-keypoint pose head.
    FaceDetector,
    /// ArcFace identity embedding.
    FaceDescriptor,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::FaceDetector, ModelKind::FaceDescriptor];

    pub fn file_name(self) -> &'static str {
        match self {
            ModelKind::FaceDetector => FACE_DETECTOR_MODEL_NAME,
            ModelKind::FaceDescriptor => FACE_DESCRIPTOR_MODEL_NAME,
        }
    }

    pub fn url(self) -> &'static str {
        match self {
            ModelKind::FaceDetector => FACE_DETECTOR_MODEL_URL,
            ModelKind::FaceDescriptor => FACE_DESCRIPTOR_MODEL_URL,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelKind::FaceDetector => "face detector",
            ModelKind::FaceDescriptor => "face descriptor",
        }
    }
}

/// Where a model is in its startup lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelLoadState {
    Loading,
    Ready,
    Failed(String),
}

/// Resolves the model file for `kind`, preferring `weights_dir`.
pub fn resolve(
    kind: ModelKind,
    weights_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    model_resolver::resolve(kind.file_name(), kind.url(), weights_dir, progress)
}

/// Resolved model paths. The descriptor is optional because only
/// descriptor-enabled requests need it.
#[derive(Clone, Debug)]
pub struct ModelSet {
    pub detector: PathBuf,
    pub descriptor: Option<PathBuf>,
}

impl ModelSet {
    /// Builds the detector stack: YOLO detection, plus descriptor extraction
    /// when a descriptor model is present.
    pub fn build_detector(
        &self,
        confidence: f64,
    ) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
        let yolo = OnnxYoloDetector::new(&self.detector, confidence)?;
        let extractor = match &self.descriptor {
            Some(path) => {
                Some(Box::new(OnnxDescriptorExtractor::new(path)?) as Box<dyn DescriptorExtractor>)
            }
            None => None,
        };
        Ok(Box::new(DescribingFaceDetector::new(Box::new(yolo), extractor)))
    }
}
