use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::acquisition::domain::media_downloader::{DownloadError, MediaDownloader};
use crate::shared::constants::{DEFAULT_DOWNLOAD_DIR, DOWNLOAD_FILE_NAME};

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("no video reference given")]
    EmptyReference,
    #[error("failed to prepare {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),
    #[error("download finished but {0} was not created")]
    MissingOutput(PathBuf),
}

/// Turns a remote reference into a local playable file at a fixed path.
pub struct VideoAcquirer {
    downloader: Box<dyn MediaDownloader>,
    out_dir: PathBuf,
    file_name: String,
}

impl VideoAcquirer {
    pub fn new(downloader: Box<dyn MediaDownloader>) -> Self {
        Self {
            downloader,
            out_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            file_name: DOWNLOAD_FILE_NAME.to_string(),
        }
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn destination(&self) -> PathBuf {
        self.out_dir.join(&self.file_name)
    }

    pub fn acquire(&self, reference: &str) -> Result<PathBuf, AcquisitionError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AcquisitionError::EmptyReference);
        }

        fs::create_dir_all(&self.out_dir).map_err(|e| AcquisitionError::CreateDir {
            path: self.out_dir.clone(),
            source: e,
        })?;

        let dest = self.destination();
        remove_previous(&dest)?;

        eprintln!("Downloading video with {}...", self.downloader.name());
        self.downloader.download(reference, &dest)?;

        if !dest.is_file() {
            return Err(AcquisitionError::MissingOutput(dest));
        }
        eprintln!("Download complete: {}", dest.display());
        Ok(dest)
    }
}

fn remove_previous(dest: &Path) -> Result<(), AcquisitionError> {
    match fs::remove_file(dest) {
        Ok(()) => {
            log::debug!("Removed previous download {}", dest.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AcquisitionError::CreateDir {
            path: dest.to_path_buf(),
            source: e,
        }),
    }
}
