use crate::detection::domain::detection::{Detection, FaceDetection, HandLandmarks};
use crate::rendering::domain::drawing_spec::{Color, FaceStyle, HandStyle};
use crate::rendering::domain::overlay_renderer::OverlayRenderer;
use crate::rendering::infrastructure::raster::{draw_line, draw_rect, fill_circle};
use crate::shared::frame::Frame;

/// Draws face boxes with keypoints and hand skeletons with per-finger colors.
#[derive(Clone, Debug, Default)]
pub struct LandmarkRenderer {
    face: FaceStyle,
    hand: HandStyle,
}

impl LandmarkRenderer {
    fn draw_face(&self, frame: &mut Frame, face: &FaceDetection) {
        let order = frame.order();
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        let max_x = frame.width() as i64 - 1;
        let max_y = frame.height() as i64 - 1;

        let b = &face.bbox;
        let clamp_x = |v: f32| ((v * w) as i64).clamp(0, max_x);
        let clamp_y = |v: f32| ((v * h) as i64).clamp(0, max_y);
        draw_rect(
            frame,
            (clamp_x(b.xmin), clamp_y(b.ymin)),
            (clamp_x(b.xmax()), clamp_y(b.ymax())),
            self.face.bbox.thickness,
            self.face.bbox.color.channels_for(order),
        );

        let spec = &self.face.keypoint;
        for kp in &face.keypoints {
            if let Some((x, y)) = to_pixel(kp.x, kp.y, frame) {
                let color = spec.color.channels_for(order);
                fill_circle(frame, x, y, spec.circle_radius, color);
            }
        }
    }

    fn draw_hand(&self, frame: &mut Frame, hand: &HandLandmarks) {
        let order = frame.order();
        let points: Vec<Option<(i64, i64)>> = hand
            .landmarks
            .iter()
            .map(|lm| to_pixel(lm.x, lm.y, frame))
            .collect();

        for &((a, b), spec) in self.hand.connections() {
            if let (Some(Some(from)), Some(Some(to))) = (points.get(a), points.get(b)) {
                let color = spec.color.channels_for(order);
                draw_line(frame, *from, *to, spec.thickness, color);
            }
        }

        let border = Color::WHITE.channels_for(order);
        for (i, point) in points.iter().enumerate() {
            let (Some((x, y)), Some(spec)) = (point, self.hand.landmark(i)) else {
                continue;
            };
            let r = spec.circle_radius;
            let border_radius = (r + 1).max((r as f32 * 1.2) as u32);
            fill_circle(frame, *x, *y, border_radius, border);
            fill_circle(frame, *x, *y, r, spec.color.channels_for(order));
        }
    }
}

impl OverlayRenderer for LandmarkRenderer {
    fn render(
        &self,
        frame: &mut Frame,
        detections: &[Detection],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if detections.is_empty() {
            return Ok(());
        }
        if frame.channels() < 3 {
            return Err(format!(
                "cannot draw on a {}-channel frame",
                frame.channels()
            )
            .into());
        }

        for detection in detections {
            match detection {
                Detection::Face(face) => self.draw_face(frame, face),
                Detection::Hand(hand) => self.draw_hand(frame, hand),
            }
        }
        Ok(())
    }
}

/// Relative point → pixel, or `None` when it falls outside `[0, 1]`.
fn to_pixel(x: f32, y: f32, frame: &Frame) -> Option<(i64, i64)> {
    let unit = 0.0..=1.0;
    if !unit.contains(&x) || !unit.contains(&y) {
        return None;
    }
    let px = ((x * frame.width() as f32).floor() as i64).min(frame.width() as i64 - 1);
    let py = ((y * frame.height() as f32).floor() as i64).min(frame.height() as i64 - 1);
    Some((px, py))
}
