pub const FACE_WINDOW_TITLE: &str = "MediaPipe Face Detector";
pub const HAND_WINDOW_TITLE: &str = "MediaPipe Hand Detector (YouTube)";

pub const KEY_ESCAPE: u8 = 27;
pub const FACE_EXIT_KEYS: &[u8] = &[KEY_ESCAPE];
pub const HAND_EXIT_KEYS: &[u8] = &[KEY_ESCAPE, b'q', b'Q'];

/// Per-tick key poll wait; one frame interval at most.
pub const DEFAULT_KEY_WAIT_MS: u32 = 1;
/// Upper bound on the per-tick key poll wait.
pub const MAX_KEY_WAIT_MS: u32 = 1000;

pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DOWNLOAD_FILE_NAME: &str = "video.mp4";

/// mp4 video + m4a audio when both exist, otherwise the best single file.
pub const YT_DLP_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/mp4/best";
pub const YT_DLP_MERGE_FORMAT: &str = "mp4";
pub const YT_DLP_PROGRAM: &str = "yt-dlp";

pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "mkv", "webm", "avi"];

pub const FACE_SHORT_RANGE_MODEL_NAME: &str = "face_detection_short_range.onnx";
pub const FACE_FULL_RANGE_MODEL_NAME: &str = "face_detection_full_range.onnx";

pub const PALM_DETECTION_MODEL_NAME: &str = "palm_detection_full.onnx";
pub const PALM_DETECTION_MODEL_URL: &str =
    "https://github.com/opencv/opencv_zoo/raw/main/models/palm_detection_mediapipe/palm_detection_mediapipe_2023feb.onnx";

pub const HAND_LANDMARK_MODEL_NAME: &str = "hand_landmark_full.onnx";
pub const HAND_LANDMARK_MODEL_URL: &str =
    "https://github.com/opencv/opencv_zoo/raw/main/models/handpose_estimation_mediapipe/handpose_estimation_mediapipe_2023feb.onnx";

/// Cache folder under the platform cache directory.
pub const APP_DIR_NAME: &str = "Lookout";
