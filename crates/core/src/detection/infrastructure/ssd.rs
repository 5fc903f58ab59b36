//! Anchor generation and box decoding for the single-shot detectors
//! (face detection, palm detection).

use crate::detection::infrastructure::math::sigmoid;
use crate::detection::infrastructure::session::OutputTensor;

/// One output layer of an SSD network.
#[derive(Clone, Copy, Debug)]
pub struct LayerInfo {
    pub boxes_per_cell: usize,
    /// Feature map size in cells.
    pub grid: usize,
}

impl LayerInfo {
    pub const fn new(boxes_per_cell: usize, grid: usize) -> Self {
        Self {
            boxes_per_cell,
            grid,
        }
    }
}

/// Anchor center, `0..1` of the input tensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub x_center: f32,
    pub y_center: f32,
}

/// Cell-centered anchors, layer by layer, row-major, repeated per box.
pub fn generate_anchors(layers: &[LayerInfo]) -> Vec<Anchor> {
    let total = layers
        .iter()
        .map(|l| l.grid * l.grid * l.boxes_per_cell)
        .sum();
    let mut anchors = Vec::with_capacity(total);

    for layer in layers {
        let grid = layer.grid as f32;
        for y in 0..layer.grid {
            for x in 0..layer.grid {
                let anchor = Anchor {
                    x_center: (x as f32 + 0.5) / grid,
                    y_center: (y as f32 + 0.5) / grid,
                };
                anchors.extend(std::iter::repeat(anchor).take(layer.boxes_per_cell));
            }
        }
    }

    anchors
}

/// A decoded candidate before suppression.
///
/// Coordinates are `0..1` of the (letterboxed) input tensor.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub score: f32,
    /// `[xmin, ymin, xmax, ymax]`
    pub rect: [f32; 4],
    pub keypoints: Vec<[f32; 2]>,
}

/// Shapes that tie a regressor tensor to its anchors.
#[derive(Clone, Copy, Debug)]
pub struct DecodeParams {
    pub num_keypoints: usize,
    pub input_size: f32,
    pub min_score: f32,
}

impl DecodeParams {
    /// Values per anchor: box center and size, then keypoint pairs.
    pub fn values_per_anchor(&self) -> usize {
        4 + 2 * self.num_keypoints
    }
}

/// Decodes anchors whose activated score reaches `min_score`.
///
/// Regressor values are pixel offsets in input space relative to the anchor
/// center; box width and height are absolute pixel sizes.
pub fn decode(
    regressors: &[f32],
    scores: &[f32],
    anchors: &[Anchor],
    params: &DecodeParams,
) -> Result<Vec<RawDetection>, String> {
    let stride = params.values_per_anchor();
    if scores.len() != anchors.len() || regressors.len() != anchors.len() * stride {
        return Err(format!(
            "expected {} anchors with {stride} values each, got {} scores and {} regressor values",
            anchors.len(),
            scores.len(),
            regressors.len()
        ));
    }

    let size = params.input_size;
    let mut out = Vec::new();
    for (i, (&logit, anchor)) in scores.iter().zip(anchors).enumerate() {
        let score = sigmoid(logit);
        if score < params.min_score {
            continue;
        }

        let r = &regressors[i * stride..(i + 1) * stride];
        let cx = r[0] / size + anchor.x_center;
        let cy = r[1] / size + anchor.y_center;
        let w = r[2] / size;
        let h = r[3] / size;

        let keypoints = r[4..]
            .chunks_exact(2)
            .map(|kp| [kp[0] / size + anchor.x_center, kp[1] / size + anchor.y_center])
            .collect();

        out.push(RawDetection {
            score,
            rect: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            keypoints,
        });
    }
    Ok(out)
}

/// Picks the regressor and score tensors out of a detector's outputs by
/// their last dimension.
pub fn split_outputs(
    outputs: Vec<OutputTensor>,
    values_per_anchor: usize,
) -> Result<(Vec<f32>, Vec<f32>), String> {
    let mut regressors = None;
    let mut scores = None;
    for tensor in outputs {
        match tensor.last_dim() {
            n if n == values_per_anchor && regressors.is_none() => regressors = Some(tensor.data),
            1 if scores.is_none() => scores = Some(tensor.data),
            _ => {}
        }
    }
    match (regressors, scores) {
        (Some(r), Some(s)) => Ok((r, s)),
        _ => Err(format!(
            "model outputs must include [.., {values_per_anchor}] regressors and [.., 1] scores"
        )),
    }
}
