use opencv::core::{Mat, Scalar, CV_8UC3};
use opencv::highgui;
use opencv::prelude::*;

use crate::display::domain::display_surface::{DisplayError, DisplaySurface};
use crate::shared::frame::{Frame, PixelOrder};

/// OpenCV HighGUI window. HighGUI expects BGR, so RGB frames are swapped
/// before showing.
pub struct HighguiDisplay {
    title: String,
    open: bool,
    canvas: Option<Mat>,
}

// HighGUI windows are addressed by title; the Mat buffer is owned.
unsafe impl Send for HighguiDisplay {}

impl HighguiDisplay {
    pub fn open(title: &str) -> Result<Self, DisplayError> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE).map_err(backend)?;
        log::debug!("Opened window '{title}'");
        Ok(Self {
            title: title.to_string(),
            open: true,
            canvas: None,
        })
    }

    fn canvas_for(&mut self, width: i32, height: i32) -> Result<&mut Mat, DisplayError> {
        let reuse = self
            .canvas
            .as_ref()
            .is_some_and(|m| m.cols() == width && m.rows() == height);
        if !reuse {
            let mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.))
                .map_err(backend)?;
            self.canvas = Some(mat);
        }
        self.canvas
            .as_mut()
            .ok_or_else(|| DisplayError::Backend("canvas allocation failed".into()))
    }
}

impl DisplaySurface for HighguiDisplay {
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        if !self.open {
            return Err(DisplayError::Closed);
        }
        if frame.channels() != 3 {
            return Err(DisplayError::Backend(format!(
                "expected a 3-channel frame, got {}",
                frame.channels()
            )));
        }

        let bgr;
        let pixels = match frame.order() {
            PixelOrder::Bgr => frame.data(),
            PixelOrder::Rgb => {
                bgr = frame.to_order(PixelOrder::Bgr);
                bgr.data()
            }
        };

        let title = self.title.clone();
        let canvas = self.canvas_for(frame.width() as i32, frame.height() as i32)?;
        canvas
            .data_bytes_mut()
            .map_err(backend)?
            .copy_from_slice(pixels);
        highgui::imshow(&title, &*canvas).map_err(backend)
    }

    fn poll_key(&mut self, wait_ms: u32) -> Result<Option<u8>, DisplayError> {
        if !self.open {
            return Err(DisplayError::Closed);
        }
        let delay = i32::try_from(wait_ms.max(1)).unwrap_or(i32::MAX);
        let key = highgui::wait_key(delay).map_err(backend)?;
        if key < 0 {
            return Ok(None);
        }
        Ok(Some((key & 0xFF) as u8))
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.canvas = None;
        if let Err(e) = highgui::destroy_window(&self.title) {
            log::warn!("Failed to close window '{}': {e}", self.title);
        }
    }
}

impl Drop for HighguiDisplay {
    fn drop(&mut self) {
        self.close();
    }
}

fn backend(e: opencv::Error) -> DisplayError {
    DisplayError::Backend(e.to_string())
}
