//! Argument groups and wiring shared by both demo binaries.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use lookout_core::detection::domain::detector::Detector;
use lookout_core::display::infrastructure::highgui_display::HighguiDisplay;
use lookout_core::pipeline::loop_controller::{
    LandmarkPipeline, LoopConfig, ReadFailurePolicy, StopReason,
};
use lookout_core::pipeline::pipeline_logger::ConsolePipelineLogger;
use lookout_core::rendering::infrastructure::landmark_renderer::LandmarkRenderer;
use lookout_core::shared::constants::DEFAULT_KEY_WAIT_MS;
use lookout_core::shared::model_resolver::{self, ModelLocations};
use lookout_core::video::domain::frame_source::SourceDescriptor;
use lookout_core::video::infrastructure::ffmpeg_source::FfmpegSource;

#[derive(Args, Debug)]
pub struct LoopArgs {
    /// What to do when a frame cannot be read: stop or retry-once
    #[arg(long, default_value = "stop")]
    pub on_read_failure: String,

    /// Milliseconds to wait for a key press each frame (1-1000)
    #[arg(long, default_value_t = DEFAULT_KEY_WAIT_MS)]
    pub key_wait_ms: u32,
}

impl LoopArgs {
    /// Applies the options on top of a pipeline preset.
    pub fn apply(
        &self,
        mut config: LoopConfig,
    ) -> Result<LoopConfig, Box<dyn std::error::Error>> {
        config.read_failure_policy = self.on_read_failure.parse::<ReadFailurePolicy>()?;
        config.key_wait_ms = self.key_wait_ms;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Directory containing the ONNX model files
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Base URL to download missing model files from, replacing the
    /// built-in download locations
    #[arg(long)]
    pub model_url: Option<String>,
}

impl ModelArgs {
    pub fn locations(&self) -> ModelLocations {
        ModelLocations {
            model_dir: self.model_dir.clone(),
            base_url: self.model_url.clone(),
        }
    }

    /// Resolves `name`, downloading from `default_url` unless `--model-url`
    /// is given.
    pub fn resolve(
        &self,
        name: &str,
        default_url: Option<&str>,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        log::info!("Resolving model: {name}");
        let path = model_resolver::resolve(
            name,
            default_url,
            &self.locations(),
            Some(&download_progress),
        )?;
        log::debug!("Using {}", path.display());
        Ok(path)
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = downloaded as f64 / total as f64 * 100.0;
        eprint!("\rDownloading model... {pct:.0}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading model... {} KB", downloaded / 1024);
    }
    let _ = std::io::stderr().flush();
}

/// Opens the source, window and logger around `detector` and runs the loop
/// until it stops.
pub fn run_pipeline(
    source: &SourceDescriptor,
    detector: Box<dyn Detector>,
    window_title: &str,
    config: LoopConfig,
    banner: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = FfmpegSource::open(source)?;
    let display = HighguiDisplay::open(window_title)?;

    let mut pipeline = LandmarkPipeline::new(
        Box::new(source),
        detector,
        Box::new(LandmarkRenderer::default()),
        Box::new(display),
        Box::new(ConsolePipelineLogger::default()),
        config,
    );

    eprintln!("{banner}");
    let report = pipeline.run()?;
    eprintln!("{}", stop_message(report.stop_reason));
    Ok(())
}

fn stop_message(reason: StopReason) -> &'static str {
    match reason {
        StopReason::EndOfStream => "End of video.",
        StopReason::ReadFailure => "Could not read a frame. Check the camera or file path.",
        StopReason::ExitRequested => "Exiting.",
    }
}
