use std::path::Path;

use thiserror::Error;

use crate::shared::http_download::HttpDownloadError;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("downloader program '{program}' not found; install it or pass its path")]
    ProgramNotFound { program: String },
    #[error("{program} exited with {status}")]
    Failed { program: String, status: String },
    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Http(#[from] HttpDownloadError),
}

/// Fetches a remote media reference into a local file.
pub trait MediaDownloader: Send {
    /// Writes the media to `dest`, replacing anything already there.
    fn download(&self, reference: &str, dest: &Path) -> Result<(), DownloadError>;

    /// Short name for status messages.
    fn name(&self) -> &str;
}
