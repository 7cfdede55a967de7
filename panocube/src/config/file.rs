//! Configuration file handling for ~/.panocube/config.ini.
//!
//! Loads and saves user configuration with sensible defaults, and turns the
//! loaded file into the component configs used by the pipeline, the fetcher
//! and the manifest emitter.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::{Ini, ParseOption};
use regex::Regex;
use thiserror::Error;

pub use super::defaults::*;
pub use super::settings::*;

use crate::fetch::FetchConfig;
use crate::manifest::ManifestSettings;
use crate::pipeline::PipelineConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// Values such as regular expressions are stored verbatim, so backslash
/// escapes are not interpreted.
fn parse_option() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    }
}

impl ConfigFile {
    /// Load configuration from the default path (~/.panocube/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file_opt(path, parse_option())?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.panocube/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    /// Pipeline settings from `[cube]` and `[output]`.
    ///
    /// `workers = 0` keeps the machine-derived default.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default()
            .with_cube_size(self.cube.size)
            .with_strategy(self.cube.strategy)
            .with_downsample(
                (self.cube.max_source_width, self.cube.max_source_height),
                (self.cube.downsample_width, self.cube.downsample_height),
            )
            .with_preview_size(self.output.preview_width, self.output.preview_height)
            .with_thumb_size(self.output.thumb_size);
        if self.cube.workers > 0 {
            config = config.with_workers(self.cube.workers);
        }
        config.face_quality = self.output.face_quality;
        config.preview_quality = self.output.preview_quality;
        config.thumb_quality = self.output.thumb_quality;
        config
    }

    /// Fetcher settings from `[fetch]`.
    pub fn fetch_config(&self) -> Result<FetchConfig, ConfigFileError> {
        let pattern = self
            .fetch
            .large_file_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| ConfigFileError::InvalidValue {
                section: "fetch".to_string(),
                key: "large_file_pattern".to_string(),
                value: self.fetch.large_file_pattern.clone().unwrap_or_default(),
                reason: e.to_string(),
            })?;

        Ok(FetchConfig::default()
            .with_max_retries(self.fetch.max_retries)
            .with_backoff_step(Duration::from_secs(self.fetch.backoff_secs))
            .with_timeout(Duration::from_secs(self.fetch.timeout))
            .with_large_file_threshold(Some(self.fetch.large_file_threshold))
            .with_large_file_pattern(pattern))
    }

    /// Manifest settings from `[manifest]`.
    pub fn manifest_settings(&self) -> ManifestSettings {
        ManifestSettings {
            xml_file: self.manifest.xml_file.clone(),
            html_file: self.manifest.html_file.clone(),
            skin_url: self.manifest.skin_url.clone(),
            skin_theme_url: self.manifest.skin_theme_url.clone(),
            viewer_script: self.manifest.viewer_script.clone(),
        }
    }
}

/// Get the path to the config directory (~/.panocube).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Get the path to the config file (~/.panocube/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{RenderStrategy, DEFAULT_CUBE_SIZE};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.cube.size, DEFAULT_CUBE_SIZE);
        assert_eq!(config.cube.strategy, RenderStrategy::Parallel);
        assert_eq!(config.batch.max_scenes_per_run, 0);
        assert!(config.fetch.api_key.is_none());
        assert!(config.fetch.cleanup_downloads);
        assert!(config.ledger.file.ends_with("jobs.json"));
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("missing.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.cube.size = 512;
        config.cube.workers = 3;
        config.output.directory = temp.path().join("out");
        config.fetch.large_file_pattern = Some(r"\.(tif|psb)$".to_string());
        config.fetch.api_key = Some("key-123".to_string());
        config.fetch.cleanup_downloads = false;
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_pipeline_config_conversion() {
        let mut config = ConfigFile::default();
        config.cube.size = 64;
        config.cube.workers = 12;
        config.output.thumb_quality = 80;

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.cube_size, 64);
        assert_eq!(pipeline.workers, 6);
        assert_eq!(pipeline.thumb_quality, 80);
    }

    #[test]
    fn test_fetch_config_conversion() {
        let mut config = ConfigFile::default();
        config.fetch.backoff_secs = 2;
        config.fetch.large_file_pattern = Some(r"\.tif$".to_string());

        let fetch = config.fetch_config().unwrap();
        assert_eq!(fetch.backoff_step, Duration::from_secs(2));
        assert!(fetch.name_is_large("scan.tif"));
        assert!(!fetch.name_is_large("scan.jpg"));
    }

    #[test]
    fn test_fetch_config_rejects_bad_pattern() {
        let mut config = ConfigFile::default();
        config.fetch.large_file_pattern = Some("(".to_string());
        assert!(matches!(
            config.fetch_config(),
            Err(ConfigFileError::InvalidValue { .. })
        ));
    }
}
