pub mod raster_surface;
pub mod shape_list_surface;
