//! Post-processing helpers shared by the ONNX backends.

use crate::detection::domain::face_detection::FaceDetection;

/// Greedy NMS: keep the highest-scoring box, drop any later box whose IoU
/// with a kept box exceeds `iou_thresh`. Output is sorted by score.
pub fn nms(mut dets: Vec<FaceDetection>, iou_thresh: f64) -> Vec<FaceDetection> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<FaceDetection> = Vec::with_capacity(dets.len());
    for det in dets {
        if keep.iter().all(|k| k.bbox.iou(&det.bbox) <= iou_thresh) {
            keep.push(det);
        }
    }
    keep
}

/// Nearest-neighbour sample coordinate for output pixel `dst` when mapping
/// `dst_len` pixels onto `src_len`, using pixel centres.
pub fn sample_index(dst: usize, dst_len: usize, src_len: usize) -> usize {
    (((dst as f64 + 0.5) * src_len as f64 / dst_len as f64) as usize).min(src_len - 1)
}
