pub mod annotation_overlay;
pub mod box_scaler;
pub mod overlay_surface;
