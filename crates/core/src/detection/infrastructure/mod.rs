pub mod describing_face_detector;
pub mod execution_provider;
pub mod math;
pub mod model_set;
pub mod onnx_descriptor_extractor;
pub mod onnx_yolo_detector;
