/// ArcFace descriptor extractor using ONNX Runtime.
///
/// Crops the face box out of the frame, resizes it to the model's 112×112
/// input and returns the L2-normalized embedding.
use std::path::Path;

use crate::detection::domain::face_descriptor::{DescriptorExtractor, FaceDescriptor};
use crate::detection::domain::face_detector::DetectionError;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

use super::execution_provider;
use super::math::sample_index;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxDescriptorExtractor {
    session: ort::session::Session,
}

impl OnnxDescriptorExtractor {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: execution_provider::build_session(model_path)?,
        })
    }
}

impl DescriptorExtractor for OnnxDescriptorExtractor {
    fn describe(
        &mut self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<FaceDescriptor, Box<dyn std::error::Error>> {
        let tensor = preprocess(frame, bbox)
            .ok_or_else(|| DetectionError::UnexpectedOutput(format!("empty face crop {bbox:?}")))?;
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        execution_provider::ensure_outputs(outputs.len())?;
        let embedding = outputs[0].try_extract_array::<f32>()?;
        let values = embedding
            .as_slice()
            .ok_or_else(|| DetectionError::UnexpectedOutput("non-contiguous embedding".into()))?;
        Ok(FaceDescriptor::from_raw(values.to_vec()))
    }
}

/// Crop `bbox` from the frame, resize to 112x112, normalize, NCHW layout.
///
/// Returns `None` when the box does not cover at least one whole pixel.
fn preprocess(frame: &Frame, bbox: &BoundingBox) -> Option<ndarray::Array4<f32>> {
    let crop = bbox.clamp_to(frame.size());
    let x0 = crop.x.floor() as usize;
    let y0 = crop.y.floor() as usize;
    let crop_w = (crop.right().ceil() as usize).saturating_sub(x0);
    let crop_h = (crop.bottom().ceil() as usize).saturating_sub(y0);
    if crop_w == 0 || crop_h == 0 {
        return None;
    }

    let src = frame.as_ndarray();
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    for y in 0..INPUT_SIZE {
        let src_y = y0 + sample_index(y, INPUT_SIZE, crop_h);
        for x in 0..INPUT_SIZE {
            let src_x = x0 + sample_index(x, INPUT_SIZE, crop_w);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    Some(tensor)
}
