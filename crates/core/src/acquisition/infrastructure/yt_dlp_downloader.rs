use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use crate::acquisition::domain::media_downloader::{DownloadError, MediaDownloader};
use crate::shared::constants::{YT_DLP_FORMAT, YT_DLP_MERGE_FORMAT};

/// Runs the external `yt-dlp` program.
pub struct YtDlpDownloader {
    program: String,
}

impl YtDlpDownloader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Prefers an mp4 video with m4a audio merged into mp4, falling back to
    /// the best single file.
    pub fn build_args(reference: &str, dest: &Path) -> Vec<OsString> {
        vec![
            "-f".into(),
            YT_DLP_FORMAT.into(),
            "--merge-output-format".into(),
            YT_DLP_MERGE_FORMAT.into(),
            "-o".into(),
            dest.as_os_str().to_owned(),
            "--force-overwrites".into(),
            "--quiet".into(),
            "--progress".into(),
            reference.trim().into(),
        ]
    }
}

impl MediaDownloader for YtDlpDownloader {
    fn download(&self, reference: &str, dest: &Path) -> Result<(), DownloadError> {
        let args = Self::build_args(reference, dest);
        log::debug!("Running {} {:?}", self.program, args);

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => DownloadError::ProgramNotFound {
                    program: self.program.clone(),
                },
                _ => DownloadError::Io {
                    program: self.program.clone(),
                    source: e,
                },
            })?;

        if !status.success() {
            return Err(DownloadError::Failed {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_args() {
        let dest = PathBuf::from("downloads/video.mp4");
        let args = YtDlpDownloader::build_args("  https://youtu.be/abc ", &dest);
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "-f",
                "bestvideo[ext=mp4]+bestaudio[ext=m4a]/mp4/best",
                "--merge-output-format",
                "mp4",
                "-o",
                "downloads/video.mp4",
                "--force-overwrites",
                "--quiet",
                "--progress",
                "https://youtu.be/abc",
            ]
        );
    }

    #[test]
    fn test_missing_program() {
        let downloader = YtDlpDownloader::new("lookout-no-such-downloader-program");
        let dir = tempfile::tempdir().unwrap();
        let err = downloader
            .download("https://youtu.be/abc", &dir.path().join("v.mp4"))
            .unwrap_err();
        assert!(matches!(err, DownloadError::ProgramNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_failure() {
        let downloader = YtDlpDownloader::new("false");
        let dir = tempfile::tempdir().unwrap();
        let err = downloader
            .download("https://youtu.be/abc", &dir.path().join("v.mp4"))
            .unwrap_err();
        assert!(matches!(err, DownloadError::Failed { .. }));
    }
}
