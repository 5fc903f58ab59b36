//! Frame → input tensor conversion: letterboxing for the detectors and
//! rotated crops for the landmark model.

use ndarray::{Array4, ArrayView3};

use crate::detection::infrastructure::session::{InputSpec, TensorLayout};
use crate::shared::frame::{Frame, PixelOrder};

/// How 8-bit channel values map to model input values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueRange {
    ZeroToOne,
    MinusOneToOne,
}

impl ValueRange {
    pub fn normalize(self, v: f32) -> f32 {
        match self {
            Self::ZeroToOne => v / 255.0,
            Self::MinusOneToOne => v / 127.5 - 1.0,
        }
    }
}

/// Rejects frames in the wrong channel order or with fewer than 3 channels.
pub fn ensure_order(image: &Frame, expected: PixelOrder) -> Result<(), String> {
    if image.channels() < 3 {
        return Err(format!(
            "expected a 3-channel image, got {} channel(s)",
            image.channels()
        ));
    }
    if image.order() != expected {
        return Err(format!(
            "expected {expected:?} input, got {:?}",
            image.order()
        ));
    }
    Ok(())
}

fn blank_tensor(spec: &InputSpec, range: ValueRange) -> Array4<f32> {
    Array4::from_elem(spec.tensor_shape(), range.normalize(0.0))
}

fn write_pixel(
    tensor: &mut Array4<f32>,
    layout: TensorLayout,
    y: usize,
    x: usize,
    px: [f32; 3],
) {
    for (c, v) in px.into_iter().enumerate() {
        match layout {
            TensorLayout::Nchw => tensor[[0, c, y, x]] = v,
            TensorLayout::Nhwc => tensor[[0, y, x, c]] = v,
        }
    }
}

/// Scale and padding of an aspect-preserving resize into a square input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    size: f32,
    frame_w: f32,
    frame_h: f32,
}

impl Letterbox {
    pub fn new(frame_w: u32, frame_h: u32, size: u32) -> Self {
        let (fw, fh, s) = (frame_w as f32, frame_h as f32, size as f32);
        let scale = (s / fw).min(s / fh);
        Self {
            scale,
            pad_x: (s - fw * scale) / 2.0,
            pad_y: (s - fh * scale) / 2.0,
            size: s,
            frame_w: fw,
            frame_h: fh,
        }
    }

    /// Maps a point in `0..1` of the input tensor to `0..1` of the frame.
    pub fn unmap(&self, x: f32, y: f32) -> [f32; 2] {
        [
            (x * self.size - self.pad_x) / self.scale / self.frame_w,
            (y * self.size - self.pad_y) / self.scale / self.frame_h,
        ]
    }
}

/// Resizes `frame` into a centered square of `spec.size`, padding with black.
pub fn letterbox(
    frame: &Frame,
    spec: &InputSpec,
    range: ValueRange,
) -> (Array4<f32>, Letterbox) {
    let lb = Letterbox::new(frame.width(), frame.height(), spec.size);
    let mut tensor = blank_tensor(spec, range);

    let src = frame.as_ndarray();
    let src_w = frame.width() as usize;
    let src_h = frame.height() as usize;
    if src_w == 0 || src_h == 0 {
        return (tensor, lb);
    }

    let size = spec.size as usize;
    let x0 = lb.pad_x.round() as usize;
    let y0 = lb.pad_y.round() as usize;
    let new_w = ((src_w as f32 * lb.scale).round() as usize).min(size - x0);
    let new_h = ((src_h as f32 * lb.scale).round() as usize).min(size - y0);

    // nearest neighbor, sampled at pixel centers
    for y in 0..new_h {
        let src_y = (((y as f32 + 0.5) / lb.scale) as usize).min(src_h - 1);
        for x in 0..new_w {
            let src_x = (((x as f32 + 0.5) / lb.scale) as usize).min(src_w - 1);
            let px = [0, 1, 2].map(|c| range.normalize(src[[src_y, src_x, c]] as f32));
            write_pixel(&mut tensor, spec.layout, y0 + y, x0 + x, px);
        }
    }

    (tensor, lb)
}

/// A rectangle in frame pixels, rotated clockwise by `rotation` radians
/// about its center (image y axis points down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotatedRect {
    pub cx: f32,
    pub cy: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
}

impl RotatedRect {
    /// Maps `(u, v)` in `0..1` of the unrotated rect to frame pixels.
    pub fn to_frame(&self, u: f32, v: f32) -> [f32; 2] {
        let dx = (u - 0.5) * self.width;
        let dy = (v - 0.5) * self.height;
        let (sin, cos) = self.rotation.sin_cos();
        [
            self.cx + dx * cos - dy * sin,
            self.cy + dx * sin + dy * cos,
        ]
    }

    /// Axis-aligned bounds `[xmin, ymin, xmax, ymax]` of the rotated corners.
    pub fn bounds(&self) -> [f32; 4] {
        let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .map(|(u, v)| self.to_frame(u, v));
        corners.iter().fold(
            [f32::MAX, f32::MAX, f32::MIN, f32::MIN],
            |[x0, y0, x1, y1], [x, y]| [x0.min(*x), y0.min(*y), x1.max(*x), y1.max(*y)],
        )
    }
}

/// Samples `rect` from `frame` into a square tensor with bilinear filtering.
///
/// Pixels outside the frame read as black.
pub fn crop_rotated(
    frame: &Frame,
    rect: &RotatedRect,
    spec: &InputSpec,
    range: ValueRange,
) -> Array4<f32> {
    let mut tensor = blank_tensor(spec, range);
    let src = frame.as_ndarray();
    let size = spec.size as usize;

    for y in 0..size {
        let v = (y as f32 + 0.5) / size as f32;
        for x in 0..size {
            let u = (x as f32 + 0.5) / size as f32;
            let [fx, fy] = rect.to_frame(u, v);
            let px = bilinear(&src, fx - 0.5, fy - 0.5).map(|c| range.normalize(c));
            write_pixel(&mut tensor, spec.layout, y, x, px);
        }
    }
    tensor
}

/// Bilinear sample at `(x, y)` in pixel-index coordinates, zero outside.
fn bilinear(src: &ArrayView3<'_, u8>, x: f32, y: f32) -> [f32; 3] {
    let (h, w, _) = src.dim();
    let x0 = x.floor();
    let y0 = y.floor();
    let (ax, ay) = (x - x0, y - y0);

    let fetch = |xi: f32, yi: f32, c: usize| -> f32 {
        if xi < 0.0 || yi < 0.0 || xi >= w as f32 || yi >= h as f32 {
            0.0
        } else {
            src[[yi as usize, xi as usize, c]] as f32
        }
    };

    [0, 1, 2].map(|c| {
        let top = fetch(x0, y0, c) * (1.0 - ax) + fetch(x0 + 1.0, y0, c) * ax;
        let bottom = fetch(x0, y0 + 1.0, c) * (1.0 - ax) + fetch(x0 + 1.0, y0 + 1.0, c) * ax;
        top * (1.0 - ay) + bottom * ay
    })
}
