use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpDownloadError {
    #[error("download failed for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const CHUNK_SIZE: usize = 1024 * 1024;

/// Streams `url` into `dest`, returning the number of bytes written.
///
/// The body goes to `<dest>.part` first and is renamed on success, so a
/// failed transfer never leaves a truncated file at `dest`. `progress`
/// receives `(bytes_downloaded, total_bytes)`, with `total_bytes` 0 when the
/// server sends no Content-Length.
pub fn download_to(
    url: &str,
    dest: &Path,
    progress: Option<&dyn Fn(u64, u64)>,
) -> Result<u64, HttpDownloadError> {
    let temp_path = part_path(dest);
    let result = stream_into(url, dest, &temp_path, progress);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn stream_into(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<&dyn Fn(u64, u64)>,
) -> Result<u64, HttpDownloadError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| HttpDownloadError::Request {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);

    let mut file = fs::File::create(temp_path).map_err(write_error(temp_path))?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;
    loop {
        let n = response.read(&mut buf).map_err(write_error(temp_path))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_error(temp_path))?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_error(temp_path))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(write_error(dest))?;
    Ok(downloaded)
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> HttpDownloadError {
    let path = path.to_path_buf();
    move |source| HttpDownloadError::Write { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_part_path_appends_suffix() {
        let p = part_path(Path::new("/tmp/downloads/video.mp4"));
        assert_eq!(p, PathBuf::from("/tmp/downloads/video.mp4.part"));
    }

    #[test]
    fn test_invalid_url_returns_request_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("clip.mp4");
        let result = download_to("http://invalid.nonexistent.example.com/clip.mp4", &dest, None);
        assert!(matches!(result, Err(HttpDownloadError::Request { .. })));
    }

    #[test]
    fn test_failure_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("clip.mp4");
        let _ = download_to("http://invalid.nonexistent.example.com/clip.mp4", &dest, None);
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }
}
