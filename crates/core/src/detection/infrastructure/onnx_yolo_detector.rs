/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference and NMS post-processing. Boxes
/// come back in native frame pixels, clamped to the frame.
use std::path::Path;

use crate::detection::domain::face_detection::FaceDetection;
use crate::detection::domain::face_detector::{DetectionError, DetectionOptions, FaceDetector};
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

use super::execution_provider;
use super::math;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Number of keypoint values per detection (5 landmarks × 3 values each: x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// YOLO face detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = execution_provider::build_session(model_path)?;
        let input_size =
            execution_provider::declared_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        options: DetectionOptions,
    ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        let Some((input_tensor, lb)) = letterbox(frame, self.input_size) else {
            return Ok(Vec::new());
        };

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        execution_provider::ensure_outputs(outputs.len())?;
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor
            .as_slice()
            .ok_or_else(|| DetectionError::UnexpectedOutput("non-contiguous tensor".into()))?;

        let dets = decode_output(
            data,
            tensor.shape(),
            &lb,
            self.confidence,
            options.with_landmarks,
        )?;

        let bounds = frame.size();
        Ok(math::nms(dets, NMS_IOU_THRESH)
            .into_iter()
            .map(|mut d| {
                d.bbox = d.bbox.clamp_to(bounds);
                d
            })
            .filter(|d| d.bbox.area() > 0.0)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Mapping between letterboxed model input and the source frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn to_frame(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_size` × `target_size` as an NCHW
/// float32 tensor in `[0, 1]`. `None` for a frame without pixels.
fn letterbox(frame: &Frame, target_size: u32) -> Option<(ndarray::Array4<f32>, Letterbox)> {
    if frame.size().is_empty() {
        return None;
    }
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // padded with 114/255 gray, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Some((
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    ))
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Parses raw YOLO rows `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`.
///
/// The output is `[1, features, detections]` (transposed export) or
/// `[1, detections, features]`; the smaller axis is taken as features.
fn decode_output(
    data: &[f32],
    shape: &[usize],
    lb: &Letterbox,
    confidence: f64,
    with_landmarks: bool,
) -> Result<Vec<FaceDetection>, DetectionError> {
    if shape.len() != 3 {
        return Err(DetectionError::UnexpectedOutput(format!(
            "YOLO output shape {shape:?}"
        )));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 || data.len() < num_dets * num_feats {
        return Err(DetectionError::UnexpectedOutput(format!(
            "YOLO output shape {shape:?} with {} values",
            data.len()
        )));
    }

    let value = |det: usize, feat: usize| -> f64 {
        if transposed {
            data[feat * num_dets + det] as f64
        } else {
            data[det * num_feats + feat] as f64
        }
    };

    let mut dets = Vec::new();
    for i in 0..num_dets {
        let score = value(i, 4);
        if score < confidence {
            continue;
        }

        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        let (x1, y1) = lb.to_frame(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = lb.to_frame(cx + w / 2.0, cy + h / 2.0);
        let mut det = FaceDetection::new(BoundingBox::from_corners(x1, y1, x2, y2), score);

        if with_landmarks && num_feats >= 5 + NUM_KEYPOINT_VALUES {
            let mut points = [None; 5];
            for (k, point) in points.iter_mut().enumerate() {
                let base = 5 + k * 3;
                if value(i, base + 2) >= KEYPOINT_CONF_THRESH {
                    *point = Some(lb.to_frame(value(i, base), value(i, base + 1)));
                }
            }
            det = det.with_landmarks(FaceLandmarks::new(points));
        }

        dets.push(det);
    }
    Ok(dets)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_landmarks::Landmark;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const IDENTITY: Letterbox = Letterbox {
        scale: 1.0,
        pad_x: 0,
        pad_y: 0,
    };

    /// One detection row with all five keypoints at `(kx, ky)` and confidence `kc`.
    fn row(cx: f32, cy: f32, w: f32, h: f32, conf: f32, kx: f32, ky: f32, kc: f32) -> Vec<f32> {
        let mut r = vec![cx, cy, w, h, conf];
        for _ in 0..5 {
            r.extend_from_slice(&[kx, ky, kc]);
        }
        r
    }

    /// Row-major output padded with empty anchors so detections outnumber features.
    fn anchors(rows: Vec<Vec<f32>>) -> (Vec<f32>, [usize; 3]) {
        let mut data: Vec<f32> = rows.concat();
        data.resize(32 * 20, 0.0);
        (data, [1, 32, 20])
    }

    // ── letterbox ──

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → scale 3.2, new 640x320, pad_y 160
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640).unwrap();

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2, epsilon = 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(0, 48)]
    #[case(64, 0)]
    fn test_letterbox_empty_frame_is_none(#[case] width: u32, #[case] height: u32) {
        let frame = Frame::new(Vec::new(), width, height, 3, 0);
        assert!(letterbox(&frame, 640).is_none());
    }

    #[test]
    fn test_letterbox_square_frame() {
        let frame = Frame::new(vec![128u8; 100 * 100 * 3], 100, 100, 3, 0);
        let (_, lb) = letterbox(&frame, 640).unwrap();

        assert_relative_eq!(lb.scale, 6.4, epsilon = 0.01);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 0));
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640).unwrap();

        let y = lb.pad_y as usize + 1;
        let x = lb.pad_x as usize + 1;
        assert_relative_eq!(tensor[[0, 0, y, x]], 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0, epsilon = 0.01);
    }

    #[test]
    fn test_letterbox_round_trips_coordinates() {
        let lb = Letterbox {
            scale: 0.5,
            pad_x: 0,
            pad_y: 80,
        };
        let (x, y) = lb.to_frame(100.0, 130.0);
        assert_relative_eq!(x, 200.0);
        assert_relative_eq!(y, 100.0);
    }

    // ── decode_output ──

    #[test]
    fn test_decode_row_major_layout() {
        let (data, shape) = anchors(vec![row(50.0, 50.0, 20.0, 40.0, 0.9, 0.0, 0.0, 0.0)]);
        let dets = decode_output(&data, &shape, &IDENTITY, 0.5, false).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox, BoundingBox::new(40.0, 30.0, 20.0, 40.0));
        assert_relative_eq!(dets[0].score, 0.9, epsilon = 1e-6);
        assert!(dets[0].landmarks.is_none());
    }

    #[test]
    fn test_decode_transposed_layout() {
        // feature-major, eight anchors of which two are populated
        let a = [10.0f32, 10.0, 4.0, 4.0, 0.8];
        let b = [90.0f32, 90.0, 10.0, 10.0, 0.7];
        let mut wide = vec![0.0f32; 5 * 8];
        for f in 0..5 {
            wide[f * 8] = a[f];
            wide[f * 8 + 1] = b[f];
        }
        let dets = decode_output(&wide, &[1, 5, 8], &IDENTITY, 0.5, false).unwrap();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].bbox, BoundingBox::new(8.0, 8.0, 4.0, 4.0));
        assert_eq!(dets[1].bbox, BoundingBox::new(85.0, 85.0, 10.0, 10.0));
    }

    #[test]
    fn test_decode_filters_low_confidence() {
        let (data, shape) = anchors(vec![
            row(50.0, 50.0, 20.0, 20.0, 0.2, 0.0, 0.0, 0.0),
            row(10.0, 10.0, 5.0, 5.0, 0.6, 0.0, 0.0, 0.0),
        ]);
        let dets = decode_output(&data, &shape, &IDENTITY, 0.5, false).unwrap();
        assert_eq!(dets.len(), 1);
        assert_relative_eq!(dets[0].score, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_decode_landmarks_only_when_requested() {
        let (data, shape) = anchors(vec![row(50.0, 50.0, 20.0, 20.0, 0.9, 45.0, 48.0, 0.9)]);
        let dets = decode_output(&data, &shape, &IDENTITY, 0.5, true).unwrap();

        let lm = dets[0].landmarks.as_ref().unwrap();
        assert_eq!(lm.get(Landmark::Nose), Some((45.0, 48.0)));
    }

    #[test]
    fn test_decode_low_confidence_keypoints_hidden() {
        let (data, shape) = anchors(vec![row(50.0, 50.0, 20.0, 20.0, 0.9, 45.0, 48.0, 0.1)]);
        let dets = decode_output(&data, &shape, &IDENTITY, 0.5, true).unwrap();
        assert_eq!(dets[0].landmarks.as_ref().unwrap().visible().count(), 0);
    }

    #[test]
    fn test_decode_rejects_bad_rank() {
        let result = decode_output(&[0.0; 10], &[10], &IDENTITY, 0.5, false);
        assert!(matches!(result, Err(DetectionError::UnexpectedOutput(_))));
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let result = decode_output(&[0.0; 10], &[1, 5, 8], &IDENTITY, 0.5, false);
        assert!(matches!(result, Err(DetectionError::UnexpectedOutput(_))));
    }
}
