use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;

/// Draws detections onto a frame in place.
///
/// Dimensions and channel order never change. With no detections the frame
/// is left byte-identical.
pub trait OverlayRenderer: Send {
    fn render(
        &self,
        frame: &mut Frame,
        detections: &[Detection],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
