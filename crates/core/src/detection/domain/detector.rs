use crate::detection::domain::detection::Detection;
use crate::shared::frame::{Frame, PixelOrder};

/// Runs a landmark model on one image.
///
/// Implementations never mutate the image. Configuration is fixed at
/// construction; errors are fatal to the run.
pub trait Detector: Send {
    fn detect(&mut self, image: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;

    /// Channel order `detect` accepts. Callers convert before calling.
    fn expected_order(&self) -> PixelOrder {
        PixelOrder::Rgb
    }

    /// Releases model sessions. Idempotent.
    fn close(&mut self) {}
}
