use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;

/// What to open: a capture device by index, or a video file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceDescriptor {
    Device(u32),
    File(PathBuf),
}

impl SourceDescriptor {
    /// All-digit input names a capture device; anything else is a path.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.parse::<u32>() {
            Ok(index) if trimmed.chars().all(|c| c.is_ascii_digit()) => Self::Device(index),
            _ => Self::File(PathBuf::from(trimmed)),
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(index) => write!(f, "camera {index}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot open {descriptor}: {reason}")]
    Unavailable { descriptor: String, reason: String },
    #[error("frame read failed: {0}")]
    Read(String),
}

impl SourceError {
    pub fn unavailable(descriptor: &SourceDescriptor, reason: impl fmt::Display) -> Self {
        Self::Unavailable {
            descriptor: descriptor.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Stream properties known after opening.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// 0 when unknown (live devices, some containers).
    pub total_frames: usize,
}

/// Yields frames in order from one exclusively owned camera or file.
///
/// `read` blocks until a frame is ready. Exhaustion is `Ok(None)`, never an
/// error; `Err` is reserved for a read that should have produced a frame.
pub trait FrameSource: Send {
    fn info(&self) -> &SourceInfo;

    fn read(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Releases the underlying handle. Safe to call more than once; later
    /// reads return `Ok(None)`.
    fn release(&mut self);

    fn is_released(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero("0", SourceDescriptor::Device(0))]
    #[case::two_digits("12", SourceDescriptor::Device(12))]
    #[case::padded(" 1 ", SourceDescriptor::Device(1))]
    #[case::file("video.mp4", SourceDescriptor::File(PathBuf::from("video.mp4")))]
    #[case::signed("+1", SourceDescriptor::File(PathBuf::from("+1")))]
    #[case::digits_in_path("downloads/1", SourceDescriptor::File(PathBuf::from("downloads/1")))]
    fn test_parse(#[case] input: &str, #[case] expected: SourceDescriptor) {
        assert_eq!(SourceDescriptor::parse(input), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(SourceDescriptor::Device(0).to_string(), "camera 0");
        assert_eq!(
            SourceDescriptor::File(PathBuf::from("downloads/video.mp4")).to_string(),
            "downloads/video.mp4"
        );
    }

    #[test]
    fn test_unavailable_message_names_descriptor() {
        let err = SourceError::unavailable(&SourceDescriptor::Device(2), "no such device");
        assert_eq!(err.to_string(), "cannot open camera 2: no such device");
    }
}
