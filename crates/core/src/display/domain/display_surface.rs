use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("display backend error: {0}")]
    Backend(String),
    #[error("display is closed")]
    Closed,
}

/// A window that shows frames and reports key presses.
pub trait DisplaySurface: Send {
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Waits up to `wait_ms` for a key press. The code is already masked
    /// to its low byte.
    fn poll_key(&mut self, wait_ms: u32) -> Result<Option<u8>, DisplayError>;

    /// Idempotent.
    fn close(&mut self);
}
