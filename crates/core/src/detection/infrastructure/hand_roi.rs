//! Hand region-of-interest geometry: where to crop the landmark model input,
//! from either a palm detection or the previous frame's landmarks.

use std::f32::consts::FRAC_PI_2;

use crate::detection::infrastructure::image_ops::RotatedRect;
use crate::detection::infrastructure::math::normalize_radians;

const PALM_WRIST: usize = 0;
const PALM_MIDDLE_MCP: usize = 2;
const PALM_ROI_SCALE: f32 = 2.6;
const PALM_ROI_SHIFT_Y: f32 = -0.5;

const LANDMARK_WRIST: usize = 0;
const LANDMARK_MIDDLE_MCP: usize = 9;
const LANDMARK_ROI_SCALE: f32 = 2.0;
const LANDMARK_ROI_SHIFT_Y: f32 = -0.1;

/// Wrist, knuckles and the first joint of each finger; fingertips move too
/// much to anchor the next crop.
const ROI_LANDMARKS: [usize; 12] = [0, 1, 2, 3, 5, 6, 9, 10, 13, 14, 17, 18];

/// Rotation that turns the `from → to` direction upright.
pub fn rotation_between(from: [f32; 2], to: [f32; 2]) -> f32 {
    let angle = (-(to[1] - from[1])).atan2(to[0] - from[0]);
    normalize_radians(FRAC_PI_2 - angle)
}

/// Shifts along the rect's own y axis, squares on the long side and scales.
fn expand(
    cx: f32,
    cy: f32,
    width: f32,
    height: f32,
    rotation: f32,
    scale: f32,
    shift_y: f32,
) -> RotatedRect {
    let (sin, cos) = rotation.sin_cos();
    let dy = height * shift_y;
    let side = width.max(height) * scale;
    RotatedRect {
        cx: cx - dy * sin,
        cy: cy + dy * cos,
        width: side,
        height: side,
        rotation,
    }
}

/// Hand crop from a palm detection, everything in frame pixels.
///
/// `rect` is `[xmin, ymin, xmax, ymax]`; `keypoints` are the palm model's 7
/// keypoints.
pub fn palm_roi(rect: [f32; 4], keypoints: &[[f32; 2]]) -> Option<RotatedRect> {
    let wrist = *keypoints.get(PALM_WRIST)?;
    let middle = *keypoints.get(PALM_MIDDLE_MCP)?;
    let rotation = rotation_between(wrist, middle);
    Some(expand(
        (rect[0] + rect[2]) / 2.0,
        (rect[1] + rect[3]) / 2.0,
        rect[2] - rect[0],
        rect[3] - rect[1],
        rotation,
        PALM_ROI_SCALE,
        PALM_ROI_SHIFT_Y,
    ))
}

/// Next frame's hand crop from 21 landmarks in frame pixels.
pub fn landmarks_roi(points: &[[f32; 2]]) -> Option<RotatedRect> {
    let wrist = *points.get(LANDMARK_WRIST)?;
    let middle = *points.get(LANDMARK_MIDDLE_MCP)?;
    let subset = ROI_LANDMARKS
        .iter()
        .map(|&i| points.get(i).copied())
        .collect::<Option<Vec<_>>>()?;
    let rotation = rotation_between(wrist, middle);

    let [x0, y0, x1, y1] = extent(subset.iter().copied());
    let (acx, acy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);

    // measure the extent in the hand's own frame
    let (sin, cos) = rotation.sin_cos();
    let [rx0, ry0, rx1, ry1] = extent(subset.iter().map(|&[x, y]| {
        let (dx, dy) = (x - acx, y - acy);
        [dx * cos + dy * sin, -dx * sin + dy * cos]
    }));
    let (rcx, rcy) = ((rx0 + rx1) / 2.0, (ry0 + ry1) / 2.0);

    Some(expand(
        acx + rcx * cos - rcy * sin,
        acy + rcx * sin + rcy * cos,
        rx1 - rx0,
        ry1 - ry0,
        rotation,
        LANDMARK_ROI_SCALE,
        LANDMARK_ROI_SHIFT_Y,
    ))
}

fn extent(points: impl Iterator<Item = [f32; 2]>) -> [f32; 4] {
    points.fold(
        [f32::MAX, f32::MAX, f32::MIN, f32::MIN],
        |[x0, y0, x1, y1], [x, y]| [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
    )
}
