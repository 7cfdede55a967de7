//! Resilient fetcher for remote panorama files.
//!
//! # Routing
//!
//! ```text
//!            ┌─ name matches large pattern ─┐
//!  file ─────┤                              ├──► fallback (1 attempt)
//!            └─ probed size > threshold ────┘          ▲
//!            │                                         │
//!            └──► primary, up to max_retries ──────────┘
//!                 (linear backoff between attempts)   all failed
//! ```
//!
//! A fetch succeeds only if the destination exists and is non-empty after
//! the transfer. A failed attempt removes whatever it left at the
//! destination before the next one starts.

mod config;
mod downloader;
mod drive;
mod error;
mod stream;

pub use config::{
    FetchConfig, DEFAULT_BACKOFF_STEP, DEFAULT_LARGE_FILE_THRESHOLD, DEFAULT_MAX_RETRIES,
    DEFAULT_TIMEOUT,
};
pub use downloader::{Downloader, RemoteFile};
pub use drive::{build_client, confirm_token_from_html, DriveClient, UsercontentClient};
pub use error::FetchError;
pub use stream::{stream_to_file, CHUNK_SIZE};

use std::path::Path;

use tracing::{debug, info, warn};

/// Result of a successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Size of the file on disk.
    pub bytes: u64,
    /// Attempts made, primary and fallback combined.
    pub attempts: u32,
    pub used_fallback: bool,
}

/// Retries a primary downloader, then falls back to a second one.
pub struct ResilientFetcher<P, F> {
    primary: P,
    fallback: F,
    config: FetchConfig,
}

impl ResilientFetcher<DriveClient, UsercontentClient> {
    /// Fetcher over the drive service with the standard clients.
    pub fn drive(config: FetchConfig, api_key: Option<String>) -> Result<Self, FetchError> {
        let primary = DriveClient::new(config.timeout, api_key)?;
        let fallback = UsercontentClient::new(config.timeout)?;
        Ok(Self::new(primary, fallback, config))
    }
}

impl<P: Downloader, F: Downloader> ResilientFetcher<P, F> {
    pub fn new(primary: P, fallback: F, config: FetchConfig) -> Self {
        Self {
            primary,
            fallback,
            config,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches `file` into `dest`.
    pub async fn fetch(&self, file: &RemoteFile, dest: &Path) -> Result<FetchOutcome, FetchError> {
        let mut attempts = 0u32;
        let mut last_error = None;

        if self.routes_to_fallback(file).await {
            info!(file = %file.name, "Large file, using fallback downloader directly");
        } else {
            let max_retries = self.config.max_retries;
            for retry in 0..max_retries {
                attempts += 1;
                match self.attempt(&self.primary, file, dest).await {
                    Ok(bytes) => {
                        info!(file = %file.name, bytes, attempts, "Download complete");
                        return Ok(FetchOutcome {
                            bytes,
                            attempts,
                            used_fallback: false,
                        });
                    }
                    Err(e) => {
                        warn!(
                            file = %file.name,
                            downloader = self.primary.name(),
                            attempt = retry + 1,
                            max_retries,
                            error = %e,
                            "Download attempt failed"
                        );
                        last_error = Some(e);
                    }
                }

                if retry + 1 < max_retries {
                    let wait = self.config.backoff_for(retry);
                    debug!(file = %file.name, wait_ms = wait.as_millis() as u64, "Backing off");
                    tokio::time::sleep(wait).await;
                }
            }
            info!(file = %file.name, "Primary downloader exhausted, trying fallback");
        }

        attempts += 1;
        match self.attempt(&self.fallback, file, dest).await {
            Ok(bytes) => {
                info!(file = %file.name, bytes, attempts, "Download complete via fallback");
                Ok(FetchOutcome {
                    bytes,
                    attempts,
                    used_fallback: true,
                })
            }
            Err(e) => {
                let last_error = match last_error {
                    Some(primary) => format!("{}; fallback: {}", primary, e),
                    None => e.to_string(),
                };
                Err(FetchError::Exhausted {
                    file: file.name.clone(),
                    attempts,
                    last_error,
                })
            }
        }
    }

    /// Whether `file` skips the primary path.
    async fn routes_to_fallback(&self, file: &RemoteFile) -> bool {
        if self.config.name_is_large(&file.name) {
            return true;
        }
        if self.config.large_file_threshold.is_none() {
            return false;
        }
        match self.primary.probe_size(file).await {
            Ok(Some(size)) => self.config.size_is_large(size),
            Ok(None) => false,
            Err(e) => {
                debug!(file = %file.name, error = %e, "Size probe failed, using primary");
                false
            }
        }
    }

    /// One bounded attempt; verifies the result and cleans up on failure.
    async fn attempt<D: Downloader>(
        &self,
        downloader: &D,
        file: &RemoteFile,
        dest: &Path,
    ) -> Result<u64, FetchError> {
        let result =
            match tokio::time::timeout(self.config.timeout, downloader.download(file, dest)).await
            {
                Ok(Ok(_)) => verify_download(dest).await,
                Ok(Err(e)) => Err(e),
                Err(_) => Err(FetchError::Timeout),
            };

        if result.is_err() {
            remove_partial(dest).await;
        }
        result
    }
}

/// Size of `dest`, or an error if it is missing or empty.
async fn verify_download(dest: &Path) -> Result<u64, FetchError> {
    match tokio::fs::metadata(dest).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(meta.len()),
        _ => Err(FetchError::EmptyFile(dest.to_path_buf())),
    }
}

async fn remove_partial(dest: &Path) {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => debug!(path = %dest.display(), "Removed partial download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %dest.display(), error = %e, "Failed to remove partial download"),
    }
}
