use std::path::PathBuf;
use std::process;

use clap::Parser;

use lookout_core::acquisition::infrastructure::downloader_for;
use lookout_core::acquisition::video_acquirer::VideoAcquirer;
use lookout_core::detection::domain::config::{HandTrackingConfig, ScoreActivation};
use lookout_core::detection::infrastructure::onnx_hand_tracker::OnnxHandTracker;
use lookout_core::pipeline::loop_controller::LoopConfig;
use lookout_core::shared::constants::{
    DEFAULT_DOWNLOAD_DIR, HAND_LANDMARK_MODEL_NAME, HAND_LANDMARK_MODEL_URL, HAND_WINDOW_TITLE,
    PALM_DETECTION_MODEL_NAME, PALM_DETECTION_MODEL_URL, YT_DLP_PROGRAM,
};
use lookout_core::video::domain::frame_source::SourceDescriptor;

mod common;

use common::{LoopArgs, ModelArgs};

/// Hand landmark tracking on a downloaded video.
#[derive(Parser, Debug)]
#[command(name = "hand-detector")]
struct Cli {
    /// Video page URL (YouTube and other yt-dlp sites) or direct media link
    url: String,

    /// Maximum number of hands to track
    #[arg(long, default_value_t = 2)]
    max_num_hands: usize,

    /// Minimum palm detection score (0.0-1.0)
    #[arg(long, default_value_t = 0.5)]
    min_detection_confidence: f32,

    /// Minimum landmark presence score to keep tracking a hand (0.0-1.0)
    #[arg(long, default_value_t = 0.5)]
    min_tracking_confidence: f32,

    /// Run palm detection on every frame instead of tracking
    #[arg(long)]
    static_image_mode: bool,

    /// The landmark model outputs presence and handedness as logits
    #[arg(long)]
    landmark_score_logits: bool,

    /// Directory the video is downloaded into
    #[arg(long, default_value = DEFAULT_DOWNLOAD_DIR)]
    download_dir: PathBuf,

    /// yt-dlp executable name or path
    #[arg(long = "yt-dlp", default_value = YT_DLP_PROGRAM)]
    yt_dlp: String,

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
    let (hand_config, loop_config) = validate(&cli)?;

    let palm_model = cli
        .models
        .resolve(PALM_DETECTION_MODEL_NAME, Some(PALM_DETECTION_MODEL_URL))?;
    let landmark_model = cli
        .models
        .resolve(HAND_LANDMARK_MODEL_NAME, Some(HAND_LANDMARK_MODEL_URL))?;

    eprintln!("URL: {}", cli.url.trim());
    let acquirer = VideoAcquirer::new(downloader_for(&cli.url, &cli.yt_dlp))
        .with_out_dir(&cli.download_dir);
    let video = acquirer.acquire(&cli.url)?;

    let tracker = OnnxHandTracker::new(&palm_model, &landmark_model, hand_config)?;

    common::run_pipeline(
        &SourceDescriptor::File(video),
        Box::new(tracker),
        HAND_WINDOW_TITLE,
        loop_config,
        "Playing and analyzing. Press Q or ESC in the window to exit.",
    )
}

fn validate(
    cli: &Cli,
) -> Result<(HandTrackingConfig, LoopConfig), Box<dyn std::error::Error>> {
    if cli.url.trim().is_empty() {
        return Err("URL must not be empty".into());
    }

    let hand_config = HandTrackingConfig {
        static_image_mode: cli.static_image_mode,
        max_num_hands: cli.max_num_hands,
        min_detection_confidence: cli.min_detection_confidence,
        min_tracking_confidence: cli.min_tracking_confidence,
        landmark_scores: if cli.landmark_score_logits {
            ScoreActivation::Sigmoid
        } else {
            ScoreActivation::Identity
        },
    };
    hand_config.validate()?;

    let loop_config = cli.loop_args.apply(LoopConfig::hand())?;
    Ok((hand_config, loop_config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use rstest::rstest;

    const URL: &str = "https://www.youtube.com/watch?v=abc123";

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["hand-detector"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_missing_url_is_usage_error() {
        let err = Cli::try_parse_from(["hand-detector"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[URL]);
        assert_eq!(cli.download_dir, PathBuf::from("downloads"));
        assert_eq!(cli.yt_dlp, "yt-dlp");

        let (hand, looping) = validate(&cli).unwrap();
        assert_eq!(hand, HandTrackingConfig::default());
        assert_eq!(looping.exit_keys, vec![27, b'q', b'Q']);
        assert!(!looping.mirror);
    }

    #[test]
    fn test_tracking_options() {
        let cli = parse(&[
            URL,
            "--max-num-hands",
            "1",
            "--min-tracking-confidence",
            "0.8",
            "--static-image-mode",
            "--landmark-score-logits",
            "--download-dir",
            "/tmp/clips",
            "--yt-dlp",
            "/opt/bin/yt-dlp",
        ]);
        let (hand, _) = validate(&cli).unwrap();
        assert_eq!(hand.max_num_hands, 1);
        assert_eq!(hand.min_tracking_confidence, 0.8);
        assert!(hand.static_image_mode);
        assert_eq!(hand.landmark_scores, ScoreActivation::Sigmoid);
        assert_eq!(cli.download_dir, PathBuf::from("/tmp/clips"));
        assert_eq!(cli.yt_dlp, "/opt/bin/yt-dlp");
    }

    #[rstest]
    #[case::no_hands(&[URL, "--max-num-hands", "0"], "at least 1")]
    #[case::detection(&[URL, "--min-detection-confidence", "1.2"], "min_detection_confidence")]
    #[case::tracking(&[URL, "--min-tracking-confidence", "2"], "min_tracking_confidence")]
    #[case::blank_url(&["  "], "URL")]
    fn test_validate_rejects(#[case] args: &[&str], #[case] message: &str) {
        let err = validate(&parse(args)).unwrap_err();
        assert!(err.to_string().contains(message), "{err}");
    }
}
