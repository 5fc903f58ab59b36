#[cfg(feature = "highgui")]
pub mod highgui_display;
