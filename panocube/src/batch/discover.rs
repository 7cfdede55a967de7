//! Input discovery.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// File extensions accepted as panorama inputs (case-insensitive).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Errors that can occur while collecting inputs.
#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("input path not found: {0}")]
    NotFound(PathBuf),

    #[error("not a supported panorama file (expected jpg, jpeg or png): {0}")]
    Unsupported(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether `path` has a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Collects panorama inputs from a file or a directory.
///
/// A directory is scanned non-recursively. The result is sorted by file name
/// and free of duplicates, so the submission order is stable between runs.
pub fn discover_inputs(path: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    if path.is_file() {
        if is_supported_image(path) {
            return Ok(vec![path.to_path_buf()]);
        }
        return Err(DiscoverError::Unsupported(path.to_path_buf()));
    }

    if !path.is_dir() {
        return Err(DiscoverError::NotFound(path.to_path_buf()));
    }

    let io_err = |source| DiscoverError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(path).map_err(io_err)? {
        let entry_path = entry.map_err(io_err)?.path();
        if entry_path.is_file() && is_supported_image(&entry_path) {
            inputs.push(entry_path);
        }
    }

    inputs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    inputs.dedup();
    Ok(inputs)
}
