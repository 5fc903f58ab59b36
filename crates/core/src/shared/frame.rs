use ndarray::{ArrayView3, ArrayViewMut3};

/// Channel order of a packed 3-channel frame.
///
/// Cameras and the display window speak BGR; the landmark models want RGB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelOrder {
    Bgr,
    Rgb,
}

/// A single decoded frame: contiguous bytes in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    order: PixelOrder,
    index: usize,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        order: PixelOrder,
        index: usize,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            order,
            index,
        }
    }

    /// Packed 3-channel frame filled with one color given in `order`.
    pub fn filled(
        width: u32,
        height: u32,
        order: PixelOrder,
        pixel: [u8; 3],
        index: usize,
    ) -> Self {
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::new(data, width, height, 3, order, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn order(&self) -> PixelOrder {
        self.order
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns a copy in `order`, swapping the first and third channel when needed.
    ///
    /// Frames with fewer than three channels are copied unchanged.
    pub fn to_order(&self, order: PixelOrder) -> Frame {
        let mut converted = self.clone();
        if order != self.order && self.channels >= 3 {
            for px in converted.data.chunks_exact_mut(self.channels as usize) {
                px.swap(0, 2);
            }
        }
        converted.order = order;
        converted
    }

    /// Mirrors the frame left-to-right in place (selfie view).
    pub fn flip_horizontal(&mut self) {
        let c = self.channels as usize;
        let row_len = self.width as usize * c;
        if row_len == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(row_len) {
            let w = row.len() / c;
            for x in 0..w / 2 {
                let mirror = w - 1 - x;
                for ch in 0..c {
                    row.swap(x * c + ch, mirror * c + ch);
                }
            }
        }
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        let shape = self.shape();
        ArrayViewMut3::from_shape(shape, &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, PixelOrder::Bgr, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.order(), PixelOrder::Bgr);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, PixelOrder::Rgb, 0);
    }

    #[test]
    fn test_filled_repeats_pixel() {
        let frame = Frame::filled(2, 1, PixelOrder::Bgr, [1, 2, 3], 0);
        assert_eq!(frame.data(), &[1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_to_order_swaps_red_and_blue() {
        let frame = Frame::new(vec![10, 20, 30, 40, 50, 60], 2, 1, 3, PixelOrder::Bgr, 7);
        let rgb = frame.to_order(PixelOrder::Rgb);
        assert_eq!(rgb.order(), PixelOrder::Rgb);
        assert_eq!(rgb.data(), &[30, 20, 10, 60, 50, 40]);
        assert_eq!(rgb.index(), 7);
        // source untouched
        assert_eq!(frame.data(), &[10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_to_order_same_order_is_plain_copy() {
        let frame = Frame::new(vec![1, 2, 3], 1, 1, 3, PixelOrder::Rgb, 0);
        assert_eq!(frame.to_order(PixelOrder::Rgb), frame);
    }

    #[test]
    fn test_to_order_round_trip_restores_bytes() {
        let frame = Frame::new((0..24).collect(), 4, 2, 3, PixelOrder::Bgr, 0);
        let back = frame.to_order(PixelOrder::Rgb).to_order(PixelOrder::Bgr);
        assert_eq!(back, frame);
    }

    #[test]
    fn test_flip_horizontal_mirrors_each_row() {
        // 3x2 frame, pixel value = column id
        let data = vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4, 5, 5, 5];
        let mut frame = Frame::new(data, 3, 2, 3, PixelOrder::Bgr, 0);
        frame.flip_horizontal();
        assert_eq!(
            frame.data(),
            &[2, 2, 2, 1, 1, 1, 0, 0, 0, 5, 5, 5, 4, 4, 4, 3, 3, 3]
        );
    }

    #[test]
    fn test_flip_horizontal_keeps_channel_order_within_pixel() {
        let mut frame = Frame::new(vec![1, 2, 3, 4, 5, 6], 2, 1, 3, PixelOrder::Bgr, 0);
        frame.flip_horizontal();
        assert_eq!(frame.data(), &[4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = Frame::new(vec![0u8; 24], 4, 2, 3, PixelOrder::Rgb, 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]);
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut frame = Frame::new(vec![0u8; 12], 2, 2, 3, PixelOrder::Rgb, 0);
        {
            let mut arr = frame.as_ndarray_mut();
            arr[[0, 1, 2]] = 128;
        }
        assert_eq!(frame.as_ndarray()[[0, 1, 2]], 128);
    }
}
