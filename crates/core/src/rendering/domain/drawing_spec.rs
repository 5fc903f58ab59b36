use crate::detection::domain::detection::HAND_CONNECTIONS;
use crate::shared::frame::PixelOrder;

/// A color stored as blue, green, red.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Color {
    pub const fn bgr(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    pub const RED: Self = Self::bgr(48, 48, 255);
    pub const GREEN: Self = Self::bgr(48, 255, 48);
    pub const BLUE: Self = Self::bgr(192, 101, 21);
    pub const YELLOW: Self = Self::bgr(0, 204, 255);
    pub const GRAY: Self = Self::bgr(128, 128, 128);
    pub const PURPLE: Self = Self::bgr(128, 64, 128);
    pub const PEACH: Self = Self::bgr(180, 229, 255);
    pub const WHITE: Self = Self::bgr(224, 224, 224);
    pub const PURE_RED: Self = Self::bgr(0, 0, 255);

    /// Channel bytes in the order a frame stores them.
    pub fn channels_for(&self, order: PixelOrder) -> [u8; 3] {
        match order {
            PixelOrder::Bgr => [self.b, self.g, self.r],
            PixelOrder::Rgb => [self.r, self.g, self.b],
        }
    }
}

/// How one landmark or connection is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawingSpec {
    pub color: Color,
    /// Line width in pixels; unused for filled dots.
    pub thickness: u32,
    pub circle_radius: u32,
}

impl DrawingSpec {
    pub const fn new(color: Color, thickness: u32, circle_radius: u32) -> Self {
        Self {
            color,
            thickness,
            circle_radius,
        }
    }
}

/// Face overlay: box outline and keypoint dots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceStyle {
    pub bbox: DrawingSpec,
    pub keypoint: DrawingSpec,
}

impl Default for FaceStyle {
    fn default() -> Self {
        Self {
            bbox: DrawingSpec::new(Color::WHITE, 2, 2),
            keypoint: DrawingSpec::new(Color::PURE_RED, 2, 2),
        }
    }
}

const PALM_LANDMARKS: [usize; 6] = [0, 1, 5, 9, 13, 17];
const THUMB_LANDMARKS: [usize; 3] = [2, 3, 4];
const INDEX_LANDMARKS: [usize; 3] = [6, 7, 8];
const MIDDLE_LANDMARKS: [usize; 3] = [10, 11, 12];
const RING_LANDMARKS: [usize; 3] = [14, 15, 16];
const PINKY_LANDMARKS: [usize; 3] = [18, 19, 20];

const LANDMARK_RADIUS: u32 = 5;
const CONNECTION_THICKNESS: u32 = 2;

/// Per-finger colors for the hand overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct HandStyle {
    landmarks: [DrawingSpec; 21],
    connections: Vec<((usize, usize), DrawingSpec)>,
}

impl HandStyle {
    pub fn landmark(&self, index: usize) -> Option<&DrawingSpec> {
        self.landmarks.get(index)
    }

    pub fn connections(&self) -> &[((usize, usize), DrawingSpec)] {
        &self.connections
    }
}

impl Default for HandStyle {
    fn default() -> Self {
        let mut landmarks = [DrawingSpec::new(Color::RED, 0, LANDMARK_RADIUS); 21];
        let groups: [(&[usize], Color); 6] = [
            (&PALM_LANDMARKS, Color::RED),
            (&THUMB_LANDMARKS, Color::PEACH),
            (&INDEX_LANDMARKS, Color::PURPLE),
            (&MIDDLE_LANDMARKS, Color::YELLOW),
            (&RING_LANDMARKS, Color::GREEN),
            (&PINKY_LANDMARKS, Color::BLUE),
        ];
        for (indices, color) in groups {
            for &i in indices {
                landmarks[i].color = color;
            }
        }

        let finger = |color| DrawingSpec::new(color, CONNECTION_THICKNESS, 0);
        let palm = finger(Color::GRAY);
        let connections = HAND_CONNECTIONS
            .iter()
            .map(|&(a, b)| {
                let spec = match b {
                    2..=4 => finger(Color::PEACH),
                    6..=8 => finger(Color::PURPLE),
                    10..=12 => finger(Color::YELLOW),
                    14..=16 => finger(Color::GREEN),
                    18..=20 => finger(Color::BLUE),
                    _ => palm,
                };
                ((a, b), spec)
            })
            .collect();

        Self {
            landmarks,
            connections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_channels_follow_frame_order() {
        let c = Color::bgr(1, 2, 3);
        assert_eq!(c.channels_for(PixelOrder::Bgr), [1, 2, 3]);
        assert_eq!(c.channels_for(PixelOrder::Rgb), [3, 2, 1]);
    }

    #[rstest]
    #[case::wrist(0, Color::RED)]
    #[case::thumb_tip(4, Color::PEACH)]
    #[case::index_tip(8, Color::PURPLE)]
    #[case::middle_mcp(9, Color::RED)]
    #[case::middle_tip(12, Color::YELLOW)]
    #[case::ring_pip(14, Color::GREEN)]
    #[case::pinky_tip(20, Color::BLUE)]
    fn test_hand_landmark_colors(#[case] index: usize, #[case] color: Color) {
        assert_eq!(HandStyle::default().landmark(index).unwrap().color, color);
    }

    #[rstest]
    #[case::palm_edge((0, 5), Color::GRAY)]
    #[case::thumb_base((1, 2), Color::PEACH)]
    #[case::index((6, 7), Color::PURPLE)]
    #[case::middle((11, 12), Color::YELLOW)]
    #[case::ring((13, 14), Color::GREEN)]
    #[case::pinky((19, 20), Color::BLUE)]
    fn test_hand_connection_colors(#[case] pair: (usize, usize), #[case] color: Color) {
        let style = HandStyle::default();
        let (_, spec) = style
            .connections()
            .iter()
            .find(|(p, _)| *p == pair)
            .unwrap();
        assert_eq!(spec.color, color);
        assert_eq!(spec.thickness, 2);
    }

    #[test]
    fn test_every_connection_styled() {
        assert_eq!(HandStyle::default().connections().len(), 21);
        assert!(HandStyle::default().landmark(21).is_none());
    }
}
