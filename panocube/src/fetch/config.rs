//! Fetcher configuration.

use std::time::Duration;

use regex::Regex;

/// Primary download attempts before the fallback is used.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Linear backoff step: attempt `i` (0-based) waits `(i + 1) * step`.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(5);

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Files above this size go straight to the fallback client.
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 500 * 1024 * 1024;

/// Retry and routing policy for [`ResilientFetcher`](super::ResilientFetcher).
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub max_retries: u32,
    pub backoff_step: Duration,
    /// Upper bound on a single attempt, including the body stream.
    pub timeout: Duration,
    /// Probed size above which the primary path is skipped.
    pub large_file_threshold: Option<u64>,
    /// File names matching this go straight to the fallback client.
    pub large_file_pattern: Option<Regex>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_step: DEFAULT_BACKOFF_STEP,
            timeout: DEFAULT_TIMEOUT,
            large_file_threshold: Some(DEFAULT_LARGE_FILE_THRESHOLD),
            large_file_pattern: None,
        }
    }
}

impl FetchConfig {
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_large_file_threshold(mut self, threshold: Option<u64>) -> Self {
        self.large_file_threshold = threshold;
        self
    }

    pub fn with_large_file_pattern(mut self, pattern: Option<Regex>) -> Self {
        self.large_file_pattern = pattern;
        self
    }

    /// Wait before primary attempt `retry_index + 1`.
    pub fn backoff_for(&self, retry_index: u32) -> Duration {
        self.backoff_step * (retry_index + 1)
    }

    /// Whether the file name alone marks the file as large.
    pub fn name_is_large(&self, name: &str) -> bool {
        self.large_file_pattern
            .as_ref()
            .map(|re| re.is_match(name))
            .unwrap_or(false)
    }

    /// Whether a probed size marks the file as large.
    pub fn size_is_large(&self, size: u64) -> bool {
        self.large_file_threshold
            .map(|threshold| size > threshold)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff() {
        let config = FetchConfig::default();
        assert_eq!(config.backoff_for(0), Duration::from_secs(5));
        assert_eq!(config.backoff_for(1), Duration::from_secs(10));
        assert_eq!(config.backoff_for(2), Duration::from_secs(15));
    }

    #[test]
    fn test_large_file_rules() {
        let config = FetchConfig::default()
            .with_large_file_pattern(Some(Regex::new(r"(?i)_8k\.").unwrap()));
        assert!(config.name_is_large("lobby_8K.jpg"));
        assert!(!config.name_is_large("lobby.jpg"));
        assert!(config.size_is_large(DEFAULT_LARGE_FILE_THRESHOLD + 1));
        assert!(!config.size_is_large(DEFAULT_LARGE_FILE_THRESHOLD));

        let unlimited = FetchConfig::default().with_large_file_threshold(None);
        assert!(!unlimited.size_is_large(u64::MAX));
    }
}
