//! Fetch errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching a remote file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection or protocol failure.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-success status code.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The service answered with an HTML page instead of the file.
    #[error("received an HTML page instead of file content from {url}")]
    Interstitial { url: String },

    #[error("request timed out")]
    Timeout,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transfer finished but left no bytes on disk.
    #[error("downloaded file is missing or empty: {0}")]
    EmptyFile(PathBuf),

    /// Every primary attempt and the fallback failed.
    #[error("giving up on {file} after {attempts} attempts: {last_error}")]
    Exhausted {
        file: String,
        attempts: u32,
        last_error: String,
    },
}

impl FetchError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e.to_string())
        }
    }
}
