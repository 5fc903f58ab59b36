use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use thiserror::Error;

use crate::detection::domain::detector::Detector;
use crate::display::domain::display_surface::{DisplayError, DisplaySurface};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::rendering::domain::overlay_renderer::OverlayRenderer;
use crate::shared::constants::{
    DEFAULT_KEY_WAIT_MS, FACE_EXIT_KEYS, HAND_EXIT_KEYS, MAX_KEY_WAIT_MS,
};
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameSource, SourceError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    ReadFailure,
    ExitRequested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EndOfStream => "end of stream",
            Self::ReadFailure => "frame read failed",
            Self::ExitRequested => "exit key pressed",
        };
        f.write_str(text)
    }
}

/// What to do when the source fails to deliver a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadFailurePolicy {
    #[default]
    Stop,
    /// One immediate retry; a second failure stops the loop.
    RetryOnce,
}

impl FromStr for ReadFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" => Ok(Self::Stop),
            "retry-once" => Ok(Self::RetryOnce),
            other => Err(format!(
                "unknown read failure policy '{other}' (expected stop or retry-once)"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoopConfig {
    /// Key codes (low byte) that end the loop.
    pub exit_keys: Vec<u8>,
    pub key_wait_ms: u32,
    /// Mirror each frame before detection (selfie view).
    pub mirror: bool,
    pub read_failure_policy: ReadFailurePolicy,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            exit_keys: FACE_EXIT_KEYS.to_vec(),
            key_wait_ms: DEFAULT_KEY_WAIT_MS,
            mirror: false,
            read_failure_policy: ReadFailurePolicy::Stop,
        }
    }
}

impl LoopConfig {
    /// Camera preview: ESC exits, frames are mirrored.
    pub fn face() -> Self {
        Self {
            mirror: true,
            ..Self::default()
        }
    }

    /// Downloaded video: ESC, `q` or `Q` exits, no mirroring.
    pub fn hand() -> Self {
        Self {
            exit_keys: HAND_EXIT_KEYS.to_vec(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.exit_keys.is_empty() {
            return Err("at least one exit key is required".into());
        }
        if !(1..=MAX_KEY_WAIT_MS).contains(&self.key_wait_ms) {
            return Err(format!(
                "key_wait_ms must be between 1 and {MAX_KEY_WAIT_MS}, got {}",
                self.key_wait_ms
            ));
        }
        Ok(())
    }

    fn is_exit_key(&self, key: u8) -> bool {
        self.exit_keys.contains(&key)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Frames read from the source.
    pub ticks: usize,
    pub frames_presented: usize,
    pub stop_reason: StopReason,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("detection failed: {0}")]
    Detection(String),
    #[error("rendering failed: {0}")]
    Render(String),
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error("pipeline already stopped")]
    Stopped,
}

/// Drives one source through detection, overlay and display until the
/// stream ends, a read fails or the user presses an exit key.
///
/// Owns every resource it touches. Shutdown (source release, detector and
/// display close) runs exactly once: after `run` returns, on error, or on
/// drop.
pub struct LandmarkPipeline {
    source: Box<dyn FrameSource>,
    detector: Box<dyn Detector>,
    renderer: Box<dyn OverlayRenderer>,
    display: Box<dyn DisplaySurface>,
    logger: Box<dyn PipelineLogger>,
    config: LoopConfig,
    state: LoopState,
}

impl LandmarkPipeline {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn Detector>,
        renderer: Box<dyn OverlayRenderer>,
        display: Box<dyn DisplaySurface>,
        logger: Box<dyn PipelineLogger>,
        config: LoopConfig,
    ) -> Self {
        Self {
            source,
            detector,
            renderer,
            display,
            logger,
            config,
            state: LoopState::Running,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Runs the loop to completion. Resources are released before this
    /// returns, whatever the outcome.
    pub fn run(&mut self) -> Result<RunReport, PipelineError> {
        if self.state != LoopState::Running {
            return Err(PipelineError::Stopped);
        }

        let result = self.run_loop();
        match &result {
            Ok(report) => self.logger.info(&format!(
                "Stopped after {} frames: {}",
                report.ticks, report.stop_reason
            )),
            Err(e) => log::error!("Pipeline failed: {e}"),
        }
        self.shutdown();
        self.logger.summary();
        result
    }

    fn run_loop(&mut self) -> Result<RunReport, PipelineError> {
        let total = self.source.info().total_frames;
        let mut ticks = 0;
        let mut frames_presented = 0;

        let stop_reason = loop {
            let t0 = Instant::now();
            let mut frame = match self.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break StopReason::EndOfStream,
                Err(e) => {
                    log::warn!("{e}");
                    break StopReason::ReadFailure;
                }
            };
            self.logger.timing("read", elapsed_ms(t0));
            ticks += 1;

            if self.config.mirror {
                frame.flip_horizontal();
            }
            self.annotate(&mut frame)?;

            let t0 = Instant::now();
            self.display.present(&frame)?;
            self.logger.timing("present", elapsed_ms(t0));
            frames_presented += 1;
            self.logger.progress(ticks, total);

            if let Some(key) = self.display.poll_key(self.config.key_wait_ms)? {
                if self.config.is_exit_key(key) {
                    break StopReason::ExitRequested;
                }
            }
        };

        self.state = LoopState::Stopping;
        Ok(RunReport {
            ticks,
            frames_presented,
            stop_reason,
        })
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        match self.source.read() {
            Err(e) if self.config.read_failure_policy == ReadFailurePolicy::RetryOnce => {
                log::warn!("{e}; retrying once");
                self.source.read()
            }
            other => other,
        }
    }

    /// Detects on a copy in the detector's channel order, then draws on the
    /// display frame in its own order.
    fn annotate(&mut self, frame: &mut Frame) -> Result<(), PipelineError> {
        let wanted = self.detector.expected_order();

        let t0 = Instant::now();
        let converted = (frame.order() != wanted).then(|| frame.to_order(wanted));
        self.logger.timing("convert", elapsed_ms(t0));

        let t0 = Instant::now();
        let detections = self
            .detector
            .detect(converted.as_ref().unwrap_or(&*frame))
            .map_err(|e| PipelineError::Detection(e.to_string()))?;
        self.logger.timing("detect", elapsed_ms(t0));
        self.logger.metric("detections", detections.len() as f64);

        let t0 = Instant::now();
        self.renderer
            .render(frame, &detections)
            .map_err(|e| PipelineError::Render(e.to_string()))?;
        self.logger.timing("render", elapsed_ms(t0));
        Ok(())
    }

    /// Releases the source, closes the detector and the window. Idempotent.
    pub fn shutdown(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.state = LoopState::Stopping;
        self.source.release();
        self.detector.close();
        self.display.close();
        self.state = LoopState::Stopped;
        log::debug!("Pipeline resources released");
    }
}

impl Drop for LandmarkPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
