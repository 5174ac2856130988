use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CascadeResolveError {
    #[error("cascade file not found: {0}")]
    MissingExplicit(PathBuf),
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write cascade to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Where a cascade model may be found, in resolution order.
#[derive(Debug, Default, Clone)]
pub struct CascadeSource<'a> {
    /// A user-supplied path. When set it must exist; nothing else is tried.
    pub explicit: Option<&'a Path>,
    /// Directory shipped next to the binary or checked out with the sources.
    pub bundled_dir: Option<&'a Path>,
}

/// Resolve a cascade file by name.
///
/// Resolution order:
/// 1. Explicit path (fails if missing)
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory
/// 4. Download from URL to cache
pub fn resolve(
    name: &str,
    url: &str,
    source: &CascadeSource<'_>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, CascadeResolveError> {
    let cache_dir = cascade_cache_dir()?;
    resolve_with_cache(name, url, source, &cache_dir, progress)
}

fn resolve_with_cache(
    name: &str,
    url: &str,
    source: &CascadeSource<'_>,
    cache_dir: &Path,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, CascadeResolveError> {
    if let Some(path) = source.explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(CascadeResolveError::MissingExplicit(path.to_path_buf()))
        };
    }

    let cached_path = cache_dir.join(name);
    if cached_path.is_file() {
        return Ok(cached_path);
    }

    if let Some(dir) = source.bundled_dir {
        let bundled_path = dir.join(name);
        if bundled_path.is_file() {
            return Ok(bundled_path);
        }
    }

    log::info!("Downloading cascade {name} from {url}");
    fs::create_dir_all(cache_dir).map_err(CascadeResolveError::CacheDir)?;
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific cascade cache directory.
///
/// - macOS: `~/Library/Application Support/FaceGate/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceGate/models/` or `~/.cache/FaceGate/models/`
/// - Windows: `%LOCALAPPDATA%/FaceGate/models/`
pub fn cascade_cache_dir() -> Result<PathBuf, CascadeResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("FaceGate").join("models"))
            .ok_or(CascadeResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("FaceGate").join("models"))
            .ok_or(CascadeResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), CascadeResolveError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| CascadeResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(|e| CascadeResolveError::Download {
        url: url.to_string(),
        source: e,
    })?;

    // Write to a temp file first, then rename
    let temp_path = dest.with_extension("part");
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| CascadeResolveError::Write { path, source }
    };
    let mut file = fs::File::create(&temp_path).map_err(write_err(&temp_path))?;

    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(256 * 1024) {
        file.write_all(chunk).map_err(write_err(&temp_path))?;
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_err(&temp_path))?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(write_err(dest))?;
    Ok(())
}
