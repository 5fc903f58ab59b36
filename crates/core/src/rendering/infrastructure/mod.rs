pub mod landmark_renderer;
pub mod raster;
