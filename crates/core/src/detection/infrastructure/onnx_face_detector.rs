/// BlazeFace face detector using ONNX Runtime via `ort`.
///
/// Produces one box and six keypoints per face. The short-range model is
/// tuned for faces within about 2 m of the camera, full range for about 5 m.
use std::path::Path;

use crate::detection::domain::config::{FaceDetectionConfig, FaceModel};
use crate::detection::domain::detection::{
    BoundingBox, Detection, FaceDetection, Keypoint, FACE_KEYPOINT_COUNT,
};
use crate::detection::domain::detector::Detector;
use crate::detection::infrastructure::image_ops::{ensure_order, letterbox, Letterbox, ValueRange};
use crate::detection::infrastructure::nms::{weighted_nms, DEFAULT_IOU_THRESH};
use crate::detection::infrastructure::session::{load_model, run_model, InputSpec, OutputTensor};
use crate::detection::infrastructure::ssd::{self, Anchor, DecodeParams, LayerInfo};
use crate::shared::frame::{Frame, PixelOrder};

const SHORT_RANGE_LAYERS: [LayerInfo; 2] = [LayerInfo::new(2, 16), LayerInfo::new(6, 8)];
const FULL_RANGE_LAYERS: [LayerInfo; 1] = [LayerInfo::new(1, 48)];

fn anchor_layers(model: FaceModel) -> &'static [LayerInfo] {
    match model {
        FaceModel::ShortRange => &SHORT_RANGE_LAYERS,
        FaceModel::FullRange => &FULL_RANGE_LAYERS,
    }
}

fn default_input_size(model: FaceModel) -> u32 {
    match model {
        FaceModel::ShortRange => 128,
        FaceModel::FullRange => 192,
    }
}

/// BlazeFace detector backed by an ONNX Runtime session.
pub struct OnnxFaceDetector {
    session: Option<ort::session::Session>,
    input: InputSpec,
    anchors: Vec<Anchor>,
    config: FaceDetectionConfig,
}

impl OnnxFaceDetector {
    /// Load the model matching `config.model`.
    pub fn new(
        model_path: &Path,
        config: FaceDetectionConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;
        let (session, input) = load_model(model_path, default_input_size(config.model))?;
        let anchors = ssd::generate_anchors(anchor_layers(config.model));
        log::info!(
            "Face detector ready: {:?}, {} anchors, min confidence {}",
            config.model,
            anchors.len(),
            config.min_detection_confidence
        );
        Ok(Self {
            session: Some(session),
            input,
            anchors,
            config,
        })
    }
}

impl Detector for OnnxFaceDetector {
    fn detect(&mut self, image: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        ensure_order(image, self.expected_order())?;
        let session = self.session.as_mut().ok_or("face detector is closed")?;

        // 1. Preprocess: letterbox into the model input, values in [-1, 1]
        let (tensor, lb) = letterbox(image, &self.input, ValueRange::MinusOneToOne);

        // 2. Inference
        let outputs = run_model(session, tensor)?;

        // 3. Decode anchors, merge overlaps, undo the letterbox
        let faces = decode_faces(
            outputs,
            &self.anchors,
            self.input.size,
            &lb,
            self.config.min_detection_confidence,
        )?;
        Ok(faces.into_iter().map(Detection::Face).collect())
    }

    fn expected_order(&self) -> PixelOrder {
        PixelOrder::Rgb
    }

    fn close(&mut self) {
        if self.session.take().is_some() {
            log::debug!("Face detector session released");
        }
    }
}

fn decode_faces(
    outputs: Vec<OutputTensor>,
    anchors: &[Anchor],
    input_size: u32,
    lb: &Letterbox,
    min_score: f32,
) -> Result<Vec<FaceDetection>, String> {
    let params = DecodeParams {
        num_keypoints: FACE_KEYPOINT_COUNT,
        input_size: input_size as f32,
        min_score,
    };
    let (regressors, scores) = ssd::split_outputs(outputs, params.values_per_anchor())?;
    let candidates = ssd::decode(&regressors, &scores, anchors, &params)?;

    let faces = weighted_nms(candidates, DEFAULT_IOU_THRESH)
        .into_iter()
        .map(|det| {
            let [x0, y0] = lb.unmap(det.rect[0], det.rect[1]);
            let [x1, y1] = lb.unmap(det.rect[2], det.rect[3]);
            let mut keypoints = [Keypoint::default(); FACE_KEYPOINT_COUNT];
            for (kp, raw) in keypoints.iter_mut().zip(&det.keypoints) {
                let [x, y] = lb.unmap(raw[0], raw[1]);
                *kp = Keypoint { x, y };
            }
            FaceDetection {
                score: det.score,
                bbox: BoundingBox {
                    xmin: x0,
                    ymin: y0,
                    width: x1 - x0,
                    height: y1 - y0,
                },
                keypoints,
            }
        })
        .collect();
    Ok(faces)
}
