use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// L2-normalized face embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceDescriptor(Vec<f32>);

impl FaceDescriptor {
    /// Normalizes `values` to unit length. A zero vector stays zero.
    pub fn from_raw(mut values: Vec<f32>) -> Self {
        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in values.iter_mut() {
                *x /= norm;
            }
        }
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Computes an identity embedding for the face inside `bbox`.
pub trait DescriptorExtractor: Send {
    fn describe(
        &mut self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<FaceDescriptor, Box<dyn std::error::Error>>;
}
