pub mod hand_roi;
pub mod image_ops;
pub mod math;
pub mod nms;
pub mod onnx_face_detector;
pub mod onnx_hand_tracker;
pub mod session;
pub mod ssd;
