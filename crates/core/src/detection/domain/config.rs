use thiserror::Error;

use crate::shared::constants::{FACE_FULL_RANGE_MODEL_NAME, FACE_SHORT_RANGE_MODEL_NAME};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f32 },
    #[error("max_num_hands must be at least 1")]
    NoHands,
    #[error("unknown model selection {0} (expected 0 for short range or 1 for full range)")]
    UnknownModelSelection(u8),
}

/// Which face detection model to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaceModel {
    /// Faces within about 2 m of the camera.
    #[default]
    ShortRange,
    /// Faces within about 5 m.
    FullRange,
}

impl FaceModel {
    /// Maps the numeric model selection (0 short range, 1 full range).
    pub fn from_selection(selection: u8) -> Result<Self, ConfigError> {
        match selection {
            0 => Ok(Self::ShortRange),
            1 => Ok(Self::FullRange),
            other => Err(ConfigError::UnknownModelSelection(other)),
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::ShortRange => FACE_SHORT_RANGE_MODEL_NAME,
            Self::FullRange => FACE_FULL_RANGE_MODEL_NAME,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FaceDetectionConfig {
    pub model: FaceModel,
    pub min_detection_confidence: f32,
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            model: FaceModel::ShortRange,
            min_detection_confidence: 0.5,
        }
    }
}

impl FaceDetectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("min_detection_confidence", self.min_detection_confidence)
    }
}

/// How the landmark model's presence and handedness outputs are turned into
/// probabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoreActivation {
    /// The model ends in a sigmoid, as the MediaPipe release does.
    #[default]
    Identity,
    /// Conversions with the final sigmoid stripped emit raw logits.
    Sigmoid,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HandTrackingConfig {
    /// Run palm detection on every frame instead of tracking.
    pub static_image_mode: bool,
    pub max_num_hands: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub landmark_scores: ScoreActivation,
}

impl Default for HandTrackingConfig {
    fn default() -> Self {
        Self {
            static_image_mode: false,
            max_num_hands: 2,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            landmark_scores: ScoreActivation::Identity,
        }
    }
}

impl HandTrackingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_num_hands == 0 {
            return Err(ConfigError::NoHands);
        }
        check_threshold("min_detection_confidence", self.min_detection_confidence)?;
        check_threshold("min_tracking_confidence", self.min_tracking_confidence)
    }

    /// Threshold a landmark presence score must reach to keep a hand.
    pub fn presence_threshold(&self) -> f32 {
        if self.static_image_mode {
            self.min_detection_confidence
        } else {
            self.min_tracking_confidence
        }
    }
}

fn check_threshold(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ThresholdOutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        assert!(FaceDetectionConfig::default().validate().is_ok());
        assert!(HandTrackingConfig::default().validate().is_ok());
        assert_eq!(HandTrackingConfig::default().max_num_hands, 2);
        assert!(!HandTrackingConfig::default().static_image_mode);
        assert_eq!(
            HandTrackingConfig::default().landmark_scores,
            ScoreActivation::Identity
        );
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(1.0, true)]
    #[case(0.75, true)]
    #[case(-0.01, false)]
    #[case(1.5, false)]
    #[case(f32::NAN, false)]
    fn test_face_threshold_range(#[case] value: f32, #[case] ok: bool) {
        let config = FaceDetectionConfig {
            min_detection_confidence: value,
            ..Default::default()
        };
        assert_eq!(config.validate().is_ok(), ok);
    }

    #[test]
    fn test_zero_hands_rejected() {
        let config = HandTrackingConfig {
            max_num_hands: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoHands));
    }

    #[test]
    fn test_tracking_threshold_checked() {
        let config = HandTrackingConfig {
            min_tracking_confidence: 2.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange {
                name: "min_tracking_confidence",
                value: 2.0
            })
        );
    }

    #[rstest]
    #[case(false, 0.3)]
    #[case(true, 0.8)]
    fn test_presence_threshold_follows_mode(#[case] static_image_mode: bool, #[case] expected: f32) {
        let config = HandTrackingConfig {
            static_image_mode,
            min_detection_confidence: 0.8,
            min_tracking_confidence: 0.3,
            ..Default::default()
        };
        assert_eq!(config.presence_threshold(), expected);
    }

    #[rstest]
    #[case(0, Ok(FaceModel::ShortRange))]
    #[case(1, Ok(FaceModel::FullRange))]
    #[case(2, Err(ConfigError::UnknownModelSelection(2)))]
    fn test_model_selection(#[case] selection: u8, #[case] expected: Result<FaceModel, ConfigError>) {
        assert_eq!(FaceModel::from_selection(selection), expected);
    }

    #[test]
    fn test_model_file_names_differ() {
        assert_ne!(
            FaceModel::ShortRange.file_name(),
            FaceModel::FullRange.file_name()
        );
    }
}
