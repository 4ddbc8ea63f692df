pub mod detection_worker;
pub mod model_cache;
pub mod playback_worker;
