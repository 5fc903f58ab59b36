use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;
use crate::shared::http_download::{self, HttpDownloadError};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error(transparent)]
    Download(#[from] HttpDownloadError),
    #[error("model {name} not found (searched: {searched}); pass --model-dir or --model-url")]
    NotFound { name: String, searched: String },
}

/// Where to look for model files, in priority order.
#[derive(Clone, Debug, Default)]
pub struct ModelLocations {
    /// Directory supplied by the operator; checked first.
    pub model_dir: Option<PathBuf>,
    /// Base URL the model name is appended to when nothing local exists.
    /// Overrides the model's default URL.
    pub base_url: Option<String>,
}

/// Resolve a model file by name.
///
/// Resolution order:
/// 1. `model_dir`, when given
/// 2. User cache directory (platform-specific)
/// 3. Download into the cache from `<base_url>/<name>` when a base URL is
///    given, otherwise from `default_url`
pub fn resolve(
    name: &str,
    default_url: Option<&str>,
    locations: &ModelLocations,
    progress: Option<&dyn Fn(u64, u64)>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(name, default_url, locations, &model_cache_dir()?, progress)
}

fn resolve_in(
    name: &str,
    default_url: Option<&str>,
    locations: &ModelLocations,
    cache_dir: &Path,
    progress: Option<&dyn Fn(u64, u64)>,
) -> Result<PathBuf, ModelResolveError> {
    let mut searched = Vec::new();

    if let Some(dir) = &locations.model_dir {
        let candidate = dir.join(name);
        if candidate.exists() {
            return Ok(candidate);
        }
        searched.push(candidate.display().to_string());
    }

    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }
    searched.push(cached_path.display().to_string());

    let url = match (&locations.base_url, default_url) {
        (Some(base_url), _) => model_url(base_url, name),
        (None, Some(url)) => url.to_string(),
        (None, None) => {
            return Err(ModelResolveError::NotFound {
                name: name.to_string(),
                searched: searched.join(", "),
            })
        }
    };

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {name} from {url}");
    http_download::download_to(&url, &cached_path, progress)?;
    Ok(cached_path)
}

fn model_url(base_url: &str, name: &str) -> String {
    format!("{}/{name}", base_url.trim_end_matches('/'))
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Lookout/models/`
/// - Linux: `$XDG_CACHE_HOME/Lookout/models/` or `~/.cache/Lookout/models/`
/// - Windows: `%LOCALAPPDATA%/Lookout/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join(APP_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}
