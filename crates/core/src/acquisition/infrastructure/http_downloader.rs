use std::io::Write;
use std::path::Path;

use crate::acquisition::domain::media_downloader::{DownloadError, MediaDownloader};
use crate::shared::http_download::download_to;

/// Streams a direct media link with reqwest.
pub struct HttpDownloader;

impl MediaDownloader for HttpDownloader {
    fn download(&self, reference: &str, dest: &Path) -> Result<(), DownloadError> {
        let progress = |done: u64, total: u64| {
            if total > 0 {
                eprint!("\rDownloading video... {}%", done * 100 / total);
            } else {
                eprint!("\rDownloading video... {} MB", done / (1024 * 1024));
            }
            let _ = std::io::stderr().flush();
        };
        let bytes = download_to(reference.trim(), dest, Some(&progress))?;
        eprintln!();
        log::info!("Downloaded {bytes} bytes to {}", dest.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}
