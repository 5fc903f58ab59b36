use crate::detection::infrastructure::math::bbox_iou;
use crate::detection::infrastructure::ssd::RawDetection;

/// Overlap at which two candidates describe the same object.
pub const DEFAULT_IOU_THRESH: f32 = 0.3;

/// Weighted non-maximum suppression.
///
/// Candidates are taken highest score first. Every remaining candidate that
/// overlaps the seed by at least `iou_thresh` is merged into it: box and
/// keypoints become the score-weighted mean of the cluster, the score stays
/// the seed's. Output is ordered by descending score.
pub fn weighted_nms(mut detections: Vec<RawDetection>, iou_thresh: f32) -> Vec<RawDetection> {
    // ascending, so the best candidate pops off the back
    detections.sort_by(|a, b| a.score.total_cmp(&b.score));

    let mut keep = Vec::new();
    while let Some(seed) = detections.pop() {
        let (cluster, rest): (Vec<_>, Vec<_>) = detections
            .into_iter()
            .partition(|other| bbox_iou(&seed.rect, &other.rect) >= iou_thresh);
        detections = rest;

        if cluster.is_empty() {
            keep.push(seed);
            continue;
        }

        let mut rect = [0.0f32; 4];
        let mut keypoints = vec![[0.0f32; 2]; seed.keypoints.len()];
        let mut total = 0.0;
        for det in std::iter::once(&seed).chain(&cluster) {
            let w = det.score;
            total += w;
            for (acc, v) in rect.iter_mut().zip(det.rect) {
                *acc += v * w;
            }
            for (acc, kp) in keypoints.iter_mut().zip(&det.keypoints) {
                acc[0] += kp[0] * w;
                acc[1] += kp[1] * w;
            }
        }
        if total > 0.0 {
            rect.iter_mut().for_each(|v| *v /= total);
            keypoints.iter_mut().for_each(|kp| {
                kp[0] /= total;
                kp[1] /= total;
            });
        } else {
            rect = seed.rect;
            keypoints = seed.keypoints.clone();
        }

        keep.push(RawDetection {
            score: seed.score,
            rect,
            keypoints,
        });
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn det(score: f32, rect: [f32; 4], kp: [f32; 2]) -> RawDetection {
        RawDetection {
            score,
            rect,
            keypoints: vec![kp],
        }
    }

    #[test]
    fn test_overlapping_candidates_are_averaged() {
        let dets = vec![
            det(0.75, [0.0, 0.0, 10.0, 10.0], [0.0, 0.0]),
            det(0.25, [1.0, 1.0, 11.0, 11.0], [4.0, 4.0]),
        ];
        let out = weighted_nms(dets, DEFAULT_IOU_THRESH);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].score, 0.75);
        assert_abs_diff_eq!(out[0].rect[0], 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(out[0].rect[2], 10.25, epsilon = 1e-6);
        assert_abs_diff_eq!(out[0].keypoints[0][0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_separate_objects_survive_in_score_order() {
        let dets = vec![
            det(0.6, [0.0, 0.0, 10.0, 10.0], [5.0, 5.0]),
            det(0.9, [50.0, 50.0, 60.0, 60.0], [55.0, 55.0]),
        ];
        let out = weighted_nms(dets, DEFAULT_IOU_THRESH);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].score, 0.9);
        assert_eq!(out[1].score, 0.6);
        assert_eq!(out[1].rect, [0.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(weighted_nms(Vec::new(), DEFAULT_IOU_THRESH).is_empty());
    }

    #[test]
    fn test_light_overlap_below_threshold_is_kept() {
        // IoU = 25 / 175 ≈ 0.14
        let dets = vec![
            det(0.9, [0.0, 0.0, 10.0, 10.0], [0.0, 0.0]),
            det(0.8, [5.0, 5.0, 15.0, 15.0], [0.0, 0.0]),
        ];
        assert_eq!(weighted_nms(dets, DEFAULT_IOU_THRESH).len(), 2);
    }
}
