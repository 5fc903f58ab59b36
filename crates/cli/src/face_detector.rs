use std::process;

use clap::Parser;

use lookout_core::detection::domain::config::{FaceDetectionConfig, FaceModel};
use lookout_core::detection::infrastructure::onnx_face_detector::OnnxFaceDetector;
use lookout_core::pipeline::loop_controller::LoopConfig;
use lookout_core::shared::constants::FACE_WINDOW_TITLE;
use lookout_core::video::domain::frame_source::SourceDescriptor;

mod common;

use common::{LoopArgs, ModelArgs};

/// Live face detection on a camera or video file.
#[derive(Parser, Debug)]
#[command(name = "face-detector")]
struct Cli {
    /// Camera index (e.g. 0) or path to a video file
    #[arg(long, default_value = "0")]
    source: String,

    /// 0 for the short-range model (within ~2 m), 1 for full range (~5 m)
    #[arg(long, default_value_t = 0)]
    model_selection: u8,

    /// Minimum score for a face to be reported (0.0-1.0)
    #[arg(long, default_value_t = 0.5)]
    min_detection_confidence: f32,

    /// Show frames as captured instead of mirrored
    #[arg(long)]
    no_mirror: bool,

    #[command(flatten)]
    loop_args: LoopArgs,

    #[command(flatten)]
    models: ModelArgs,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (face_config, loop_config) = validate(&cli)?;

    // face models have no default download location
    let model_path = cli.models.resolve(face_config.model.file_name(), None)?;
    let detector = OnnxFaceDetector::new(&model_path, face_config)?;

    common::run_pipeline(
        &SourceDescriptor::parse(&cli.source),
        Box::new(detector),
        FACE_WINDOW_TITLE,
        loop_config,
        "Starting face detection. Press ESC to exit.",
    )
}

fn validate(
    cli: &Cli,
) -> Result<(FaceDetectionConfig, LoopConfig), Box<dyn std::error::Error>> {
    if cli.source.trim().is_empty() {
        return Err("--source must name a camera index or a file".into());
    }

    let face_config = FaceDetectionConfig {
        model: FaceModel::from_selection(cli.model_selection)?,
        min_detection_confidence: cli.min_detection_confidence,
    };
    face_config.validate()?;

    let mut loop_config = cli.loop_args.apply(LoopConfig::face())?;
    loop_config.mirror = !cli.no_mirror;

    Ok((face_config, loop_config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookout_core::pipeline::loop_controller::ReadFailurePolicy;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["face-detector"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_runs_with_no_arguments() {
        let cli = parse(&[]);
        assert_eq!(SourceDescriptor::parse(&cli.source), SourceDescriptor::Device(0));

        let (face, looping) = validate(&cli).unwrap();
        assert_eq!(face, FaceDetectionConfig::default());
        assert!(looping.mirror);
        assert_eq!(looping.exit_keys, vec![27]);
        assert_eq!(looping.key_wait_ms, 1);
        assert_eq!(looping.read_failure_policy, ReadFailurePolicy::Stop);
    }

    #[test]
    fn test_file_source_and_options() {
        let cli = parse(&[
            "--source",
            "clips/walk.mp4",
            "--model-selection",
            "1",
            "--min-detection-confidence",
            "0.7",
            "--no-mirror",
            "--on-read-failure",
            "retry-once",
        ]);
        let (face, looping) = validate(&cli).unwrap();
        assert_eq!(face.model, FaceModel::FullRange);
        assert_eq!(face.min_detection_confidence, 0.7);
        assert!(!looping.mirror);
        assert_eq!(looping.read_failure_policy, ReadFailurePolicy::RetryOnce);
        assert!(matches!(
            SourceDescriptor::parse(&cli.source),
            SourceDescriptor::File(_)
        ));
    }

    #[rstest]
    #[case::bad_selection(&["--model-selection", "2"], "model selection")]
    #[case::confidence_high(&["--min-detection-confidence", "1.5"], "between 0.0 and 1.0")]
    #[case::bad_policy(&["--on-read-failure", "ignore"], "retry-once")]
    #[case::blank_source(&["--source", " "], "--source")]
    fn test_validate_rejects(#[case] args: &[&str], #[case] message: &str) {
        let err = validate(&parse(args)).unwrap_err();
        assert!(err.to_string().contains(message), "{err}");
    }

    #[test]
    fn test_non_numeric_selection_is_usage_error() {
        let err = Cli::try_parse_from(["face-detector", "--model-selection", "far"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
