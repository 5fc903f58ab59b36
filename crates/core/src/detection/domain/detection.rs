/// A point in relative frame coordinates (`0..1` of width and height).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned box in relative frame coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }
}

/// Face keypoints in model output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceKeypoint {
    RightEye = 0,
    LeftEye = 1,
    NoseTip = 2,
    MouthCenter = 3,
    RightEarTragion = 4,
    LeftEarTragion = 5,
}

pub const FACE_KEYPOINT_COUNT: usize = 6;

#[derive(Clone, Debug, PartialEq)]
pub struct FaceDetection {
    pub score: f32,
    pub bbox: BoundingBox,
    pub keypoints: [Keypoint; FACE_KEYPOINT_COUNT],
}

impl FaceDetection {
    pub fn keypoint(&self, which: FaceKeypoint) -> Keypoint {
        self.keypoints[which as usize]
    }
}

/// One of the 21 hand landmarks, numbered wrist-first per finger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexFingerMcp = 5,
    IndexFingerPip = 6,
    IndexFingerDip = 7,
    IndexFingerTip = 8,
    MiddleFingerMcp = 9,
    MiddleFingerPip = 10,
    MiddleFingerDip = 11,
    MiddleFingerTip = 12,
    RingFingerMcp = 13,
    RingFingerPip = 14,
    RingFingerDip = 15,
    RingFingerTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

pub const HAND_LANDMARK_COUNT: usize = 21;

/// Bone pairs between hand landmarks: palm outline, then each finger.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    // palm
    (0, 1),
    (0, 5),
    (9, 13),
    (13, 17),
    (5, 9),
    (0, 17),
    // thumb
    (1, 2),
    (2, 3),
    (3, 4),
    // index
    (5, 6),
    (6, 7),
    (7, 8),
    // middle
    (9, 10),
    (10, 11),
    (11, 12),
    // ring
    (13, 14),
    (14, 15),
    (15, 16),
    // pinky
    (17, 18),
    (18, 19),
    (19, 20),
];

/// Landmark with relative x/y and depth relative to the wrist.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    /// Hand presence score.
    pub score: f32,
    pub handedness: Handedness,
    pub landmarks: [Landmark; HAND_LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn landmark(&self, which: HandLandmark) -> Landmark {
        self.landmarks[which as usize]
    }
}

/// A structured result for one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Detection {
    Face(FaceDetection),
    Hand(HandLandmarks),
}

impl Detection {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Face(_) => "face",
            Self::Hand(_) => "hand",
        }
    }

    pub fn score(&self) -> f32 {
        match self {
            Self::Face(face) => face.score,
            Self::Hand(hand) => hand.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hand_connections_cover_every_landmark() {
        let touched: HashSet<usize> = HAND_CONNECTIONS
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .collect();
        assert_eq!(touched.len(), HAND_LANDMARK_COUNT);
        assert!(touched.iter().all(|&i| i < HAND_LANDMARK_COUNT));
    }

    #[test]
    fn test_hand_connections_are_unique() {
        let unique: HashSet<(usize, usize)> = HAND_CONNECTIONS
            .iter()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect();
        assert_eq!(unique.len(), HAND_CONNECTIONS.len());
    }

    #[test]
    fn test_named_accessors_index_arrays() {
        let mut keypoints = [Keypoint::default(); FACE_KEYPOINT_COUNT];
        keypoints[FaceKeypoint::NoseTip as usize] = Keypoint { x: 0.5, y: 0.6 };
        let face = FaceDetection {
            score: 0.9,
            bbox: BoundingBox::default(),
            keypoints,
        };
        assert_eq!(face.keypoint(FaceKeypoint::NoseTip), Keypoint { x: 0.5, y: 0.6 });

        let mut landmarks = [Landmark::default(); HAND_LANDMARK_COUNT];
        landmarks[HandLandmark::PinkyTip as usize].z = -0.2;
        let hand = HandLandmarks {
            score: 0.8,
            handedness: Handedness::Left,
            landmarks,
        };
        assert_eq!(hand.landmark(HandLandmark::PinkyTip).z, -0.2);
    }

    #[test]
    fn test_detection_kind_and_score() {
        let hand = Detection::Hand(HandLandmarks {
            score: 0.7,
            handedness: Handedness::Right,
            landmarks: [Landmark::default(); HAND_LANDMARK_COUNT],
        });
        assert_eq!(hand.kind(), "hand");
        assert_eq!(hand.score(), 0.7);
    }

    #[test]
    fn test_bbox_max_edges() {
        let bbox = BoundingBox {
            xmin: 0.1,
            ymin: 0.2,
            width: 0.3,
            height: 0.4,
        };
        assert!((bbox.xmax() - 0.4).abs() < 1e-6);
        assert!((bbox.ymax() - 0.6).abs() < 1e-6);
    }
}
