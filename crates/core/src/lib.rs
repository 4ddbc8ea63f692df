pub mod annotation;
pub mod detection;
pub mod playback;
pub mod shared;
pub mod video;
