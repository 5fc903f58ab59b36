//! Scalar helpers shared by the model decoders.

use std::f32::consts::PI;

/// Logits beyond this magnitude are clipped before activation.
pub const SCORE_CLIP: f32 = 100.0;

/// Logistic activation with the input clipped to `±SCORE_CLIP`.
pub fn sigmoid(x: f32) -> f32 {
    let x = x.clamp(-SCORE_CLIP, SCORE_CLIP);
    1.0 / (1.0 + (-x).exp())
}

/// Wraps an angle into `[-π, π)`.
pub fn normalize_radians(angle: f32) -> f32 {
    angle - 2.0 * PI * ((angle + PI) / (2.0 * PI)).floor()
}

/// IoU between two boxes represented as `[xmin, ymin, xmax, ymax]`.
pub fn bbox_iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn test_sigmoid_zero() {
        assert_abs_diff_eq!(sigmoid(0.0), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_sigmoid_saturates_without_nan() {
        assert_abs_diff_eq!(sigmoid(1e6), 1.0, epsilon = 1e-6);
        assert!(sigmoid(-1e6) >= 0.0);
        assert!(!sigmoid(f32::MAX).is_nan());
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(PI / 2.0, PI / 2.0)]
    #[case(3.0 * PI / 2.0, -PI / 2.0)]
    #[case(-3.0 * PI / 2.0, PI / 2.0)]
    #[case(5.0 * PI, -PI)]
    fn test_normalize_radians(#[case] input: f32, #[case] expected: f32) {
        assert_abs_diff_eq!(normalize_radians(input), expected, epsilon = 1e-4);
    }

    #[test]
    fn test_bbox_iou_no_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [20.0, 20.0, 30.0, 30.0];
        assert_eq!(bbox_iou(&a, &b), 0.0);
    }

    #[test]
    fn test_bbox_iou_perfect_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert_abs_diff_eq!(bbox_iou(&a, &a), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bbox_iou_partial_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [5.0, 5.0, 15.0, 15.0];
        assert_abs_diff_eq!(bbox_iou(&a, &b), 25.0 / 175.0, epsilon = 1e-6);
    }
}
