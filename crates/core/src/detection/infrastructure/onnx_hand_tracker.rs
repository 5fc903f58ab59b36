//! Two-stage hand tracker using ONNX Runtime via `ort`.
//!
//! A palm detector finds hands; a landmark model then runs on a rotated crop
//! around each hand and returns 21 landmarks, a presence score and
//! handedness. Outside static-image mode the landmarks of one frame place
//! the crop for the next, and palm detection only runs while fewer than
//! `max_num_hands` hands are tracked.
use std::path::Path;

use crate::detection::domain::config::{HandTrackingConfig, ScoreActivation};
use crate::detection::domain::detection::{
    Detection, HandLandmarks, Handedness, Landmark, HAND_LANDMARK_COUNT,
};
use crate::detection::domain::detector::Detector;
use crate::detection::infrastructure::hand_roi::{landmarks_roi, palm_roi};
use crate::detection::infrastructure::image_ops::{
    crop_rotated, ensure_order, letterbox, Letterbox, RotatedRect, ValueRange,
};
use crate::detection::infrastructure::math::{bbox_iou, sigmoid};
use crate::detection::infrastructure::nms::{weighted_nms, DEFAULT_IOU_THRESH};
use crate::detection::infrastructure::session::{load_model, run_model, InputSpec, OutputTensor};
use crate::detection::infrastructure::ssd::{self, Anchor, DecodeParams, LayerInfo};
use crate::shared::frame::{Frame, PixelOrder};

const PALM_LAYERS: [LayerInfo; 2] = [LayerInfo::new(2, 24), LayerInfo::new(6, 12)];
const PALM_KEYPOINTS: usize = 7;
const PALM_INPUT_SIZE: u32 = 192;
const LANDMARK_INPUT_SIZE: u32 = 224;

/// A new palm overlapping a tracked hand this much is the same hand.
const TRACKED_OVERLAP_IOU: f32 = 0.5;

/// Landmark model outputs per hand: x, y, z for 21 points.
const LANDMARK_VALUES: usize = HAND_LANDMARK_COUNT * 3;

pub struct OnnxHandTracker {
    palm: Option<ort::session::Session>,
    palm_input: InputSpec,
    landmark: Option<ort::session::Session>,
    landmark_input: InputSpec,
    anchors: Vec<Anchor>,
    config: HandTrackingConfig,
    /// Crops carried over from the previous frame.
    tracked: Vec<RotatedRect>,
}

impl OnnxHandTracker {
    pub fn new(
        palm_model: &Path,
        landmark_model: &Path,
        config: HandTrackingConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;
        let (palm, palm_input) = load_model(palm_model, PALM_INPUT_SIZE)?;
        let (landmark, landmark_input) = load_model(landmark_model, LANDMARK_INPUT_SIZE)?;
        let anchors = ssd::generate_anchors(&PALM_LAYERS);
        log::info!(
            "Hand tracker ready: up to {} hand(s), static mode {}, detection {} / tracking {}",
            config.max_num_hands,
            config.static_image_mode,
            config.min_detection_confidence,
            config.min_tracking_confidence
        );
        Ok(Self {
            palm: Some(palm),
            palm_input,
            landmark: Some(landmark),
            landmark_input,
            anchors,
            config,
            tracked: Vec::new(),
        })
    }

    fn detect_palms(
        &mut self,
        image: &Frame,
    ) -> Result<Vec<RotatedRect>, Box<dyn std::error::Error>> {
        let session = self.palm.as_mut().ok_or("hand tracker is closed")?;
        let (tensor, lb) = letterbox(image, &self.palm_input, ValueRange::ZeroToOne);
        let outputs = run_model(session, tensor)?;
        let palms = decode_palms(
            outputs,
            &self.anchors,
            self.palm_input.size,
            &lb,
            self.config.min_detection_confidence,
            (image.width() as f32, image.height() as f32),
        )?;
        Ok(palms)
    }

    fn estimate_landmarks(
        &mut self,
        image: &Frame,
        roi: &RotatedRect,
    ) -> Result<(HandLandmarks, Vec<[f32; 2]>), Box<dyn std::error::Error>> {
        let session = self.landmark.as_mut().ok_or("hand tracker is closed")?;
        let tensor = crop_rotated(image, roi, &self.landmark_input, ValueRange::ZeroToOne);
        let outputs = run_model(session, tensor)?;
        let hand = decode_landmarks(
            outputs,
            roi,
            self.landmark_input.size,
            (image.width() as f32, image.height() as f32),
            self.config.landmark_scores,
        )?;
        Ok(hand)
    }
}

impl Detector for OnnxHandTracker {
    fn detect(&mut self, image: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        ensure_order(image, self.expected_order())?;

        let max_hands = self.config.max_num_hands;
        let tracking = !self.config.static_image_mode;

        // 1. Crops: tracked hands first, palms fill the remaining slots
        let tracked = if tracking {
            std::mem::take(&mut self.tracked)
        } else {
            Vec::new()
        };
        let mut rois = merge_rois(tracked, Vec::new(), max_hands);
        if rois.len() < max_hands {
            let palms = self.detect_palms(image)?;
            rois = merge_rois(rois, palms, max_hands);
        }

        // 2. Landmarks per crop
        let threshold = self.config.presence_threshold();
        let mut hands = Vec::with_capacity(rois.len());
        let mut next = Vec::new();
        for roi in &rois {
            let (hand, points) = self.estimate_landmarks(image, roi)?;
            if hand.score < threshold {
                log::trace!("Hand lost (presence {:.2})", hand.score);
                continue;
            }
            if tracking {
                next.extend(landmarks_roi(&points));
            }
            hands.push(Detection::Hand(hand));
        }

        // 3. Carry the surviving hands into the next frame
        self.tracked = next;
        Ok(hands)
    }

    fn expected_order(&self) -> PixelOrder {
        PixelOrder::Rgb
    }

    fn close(&mut self) {
        let had_sessions = self.palm.take().is_some() | self.landmark.take().is_some();
        self.tracked.clear();
        if had_sessions {
            log::debug!("Hand tracker sessions released");
        }
    }
}

/// Tracked crops first, then palms, skipping any crop that overlaps one
/// already kept, until `max` crops exist.
///
/// `palms` is expected in descending score order.
fn merge_rois(
    tracked: Vec<RotatedRect>,
    palms: Vec<RotatedRect>,
    max: usize,
) -> Vec<RotatedRect> {
    let mut rois: Vec<RotatedRect> = Vec::with_capacity(max);
    for roi in tracked.into_iter().chain(palms) {
        if rois.len() >= max {
            break;
        }
        let bounds = roi.bounds();
        if rois
            .iter()
            .any(|r| bbox_iou(&r.bounds(), &bounds) >= TRACKED_OVERLAP_IOU)
        {
            continue;
        }
        rois.push(roi);
    }
    rois
}

/// Palm detections → hand crops in frame pixels, best first.
fn decode_palms(
    outputs: Vec<OutputTensor>,
    anchors: &[Anchor],
    input_size: u32,
    lb: &Letterbox,
    min_score: f32,
    (fw, fh): (f32, f32),
) -> Result<Vec<RotatedRect>, String> {
    let params = DecodeParams {
        num_keypoints: PALM_KEYPOINTS,
        input_size: input_size as f32,
        min_score,
    };
    let (regressors, scores) = ssd::split_outputs(outputs, params.values_per_anchor())?;
    let candidates = ssd::decode(&regressors, &scores, anchors, &params)?;

    let to_px = |x: f32, y: f32| {
        let [rx, ry] = lb.unmap(x, y);
        [rx * fw, ry * fh]
    };
    Ok(weighted_nms(candidates, DEFAULT_IOU_THRESH)
        .into_iter()
        .filter_map(|det| {
            let [x0, y0] = to_px(det.rect[0], det.rect[1]);
            let [x1, y1] = to_px(det.rect[2], det.rect[3]);
            let keypoints: Vec<[f32; 2]> =
                det.keypoints.iter().map(|kp| to_px(kp[0], kp[1])).collect();
            palm_roi([x0, y0, x1, y1], &keypoints)
        })
        .collect())
}

/// Landmark model outputs → hand in frame-relative coordinates, plus the
/// landmarks in frame pixels for the next crop.
///
/// Outputs are screen landmarks `[.., 63]`, presence `[.., 1]`, handedness
/// `[.., 1]` and world landmarks `[.., 63]`, in that order.
fn decode_landmarks(
    outputs: Vec<OutputTensor>,
    roi: &RotatedRect,
    input_size: u32,
    (fw, fh): (f32, f32),
    activation: ScoreActivation,
) -> Result<(HandLandmarks, Vec<[f32; 2]>), String> {
    let mut screen = None;
    let mut scalars = Vec::new();
    for tensor in outputs {
        match tensor.data.len() {
            LANDMARK_VALUES if screen.is_none() => screen = Some(tensor.data),
            1 => scalars.push(tensor.data[0]),
            _ => {}
        }
    }
    let (Some(screen), [presence, handedness, ..]) = (screen, scalars.as_slice()) else {
        return Err(format!(
            "hand landmark model must output {LANDMARK_VALUES} landmark values, \
             presence and handedness"
        ));
    };

    let size = input_size as f32;
    let mut landmarks = [Landmark::default(); HAND_LANDMARK_COUNT];
    let mut points = Vec::with_capacity(HAND_LANDMARK_COUNT);
    for (lm, xyz) in landmarks.iter_mut().zip(screen.chunks_exact(3)) {
        let [px, py] = roi.to_frame(xyz[0] / size, xyz[1] / size);
        points.push([px, py]);
        *lm = Landmark {
            x: px / fw,
            y: py / fh,
            z: xyz[2] / size * roi.width / fw,
        };
    }

    let hand = HandLandmarks {
        score: activate(activation, *presence),
        handedness: if activate(activation, *handedness) > 0.5 {
            Handedness::Right
        } else {
            Handedness::Left
        },
        landmarks,
    };
    Ok((hand, points))
}

fn activate(activation: ScoreActivation, value: f32) -> f32 {
    match activation {
        ScoreActivation::Sigmoid => sigmoid(value),
        ScoreActivation::Identity => value,
    }
}
