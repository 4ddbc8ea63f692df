pub mod overlay_canvas;
pub mod primary_button;
