pub const FACE_DETECTOR_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_DETECTOR_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const FACE_DESCRIPTOR_MODEL_NAME: &str = "w600k_r50.onnx";
pub const FACE_DESCRIPTOR_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Static base path checked before the user cache when resolving weights.
pub const MODEL_WEIGHTS_DIR: &str = "models/weights";

/// Advisory filter for the file picker.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "m4v"];

/// Media-time spacing between time updates (HTML media elements fire
/// `timeupdate` every 15-250 ms; the slow end keeps detection affordable).
pub const DEFAULT_TIME_UPDATE_MS: u64 = 250;

pub const OVERLAY_STROKE_WIDTH: f32 = 2.0;
pub const OVERLAY_STROKE_COLOR: [u8; 4] = [255, 0, 0, 255];
