//! Configuration key access and validation.
//!
//! Every settable option has a [`ConfigKey`]. Keys know their INI section,
//! how to render the current value and how to validate and apply a new one.
//! The INI parser applies file values through the same keys, so a value
//! accepted by `panocube config set` is exactly a value accepted on load.

use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use super::parser::expand_tilde;
use super::settings::ConfigFile;
use super::size::{format_size, parse_size};

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Cube settings
    CubeSize,
    CubeStrategy,
    CubeWorkers,
    CubeMaxSourceWidth,
    CubeMaxSourceHeight,
    CubeDownsampleWidth,
    CubeDownsampleHeight,

    // Output settings
    OutputDirectory,
    OutputFaceQuality,
    OutputPreviewQuality,
    OutputThumbQuality,
    OutputPreviewWidth,
    OutputPreviewHeight,
    OutputThumbSize,

    // Batch settings
    BatchMaxScenesPerRun,

    // Fetch settings
    FetchUploadsDirectory,
    FetchMaxRetries,
    FetchBackoffSecs,
    FetchTimeout,
    FetchLargeFileThreshold,
    FetchLargeFilePattern,
    FetchApiKey,
    FetchCleanupDownloads,

    // Ledger settings
    LedgerFile,

    // Manifest settings
    ManifestXmlFile,
    ManifestHtmlFile,
    ManifestSkinUrl,
    ManifestSkinThemeUrl,
    ManifestViewerScript,

    // Logging settings
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == lower)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "cube.size").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::CubeSize => "cube.size",
            ConfigKey::CubeStrategy => "cube.strategy",
            ConfigKey::CubeWorkers => "cube.workers",
            ConfigKey::CubeMaxSourceWidth => "cube.max_source_width",
            ConfigKey::CubeMaxSourceHeight => "cube.max_source_height",
            ConfigKey::CubeDownsampleWidth => "cube.downsample_width",
            ConfigKey::CubeDownsampleHeight => "cube.downsample_height",
            ConfigKey::OutputDirectory => "output.directory",
            ConfigKey::OutputFaceQuality => "output.face_quality",
            ConfigKey::OutputPreviewQuality => "output.preview_quality",
            ConfigKey::OutputThumbQuality => "output.thumb_quality",
            ConfigKey::OutputPreviewWidth => "output.preview_width",
            ConfigKey::OutputPreviewHeight => "output.preview_height",
            ConfigKey::OutputThumbSize => "output.thumb_size",
            ConfigKey::BatchMaxScenesPerRun => "batch.max_scenes_per_run",
            ConfigKey::FetchUploadsDirectory => "fetch.uploads_directory",
            ConfigKey::FetchMaxRetries => "fetch.max_retries",
            ConfigKey::FetchBackoffSecs => "fetch.backoff_secs",
            ConfigKey::FetchTimeout => "fetch.timeout",
            ConfigKey::FetchLargeFileThreshold => "fetch.large_file_threshold",
            ConfigKey::FetchLargeFilePattern => "fetch.large_file_pattern",
            ConfigKey::FetchApiKey => "fetch.api_key",
            ConfigKey::FetchCleanupDownloads => "fetch.cleanup_downloads",
            ConfigKey::LedgerFile => "ledger.file",
            ConfigKey::ManifestXmlFile => "manifest.xml_file",
            ConfigKey::ManifestHtmlFile => "manifest.html_file",
            ConfigKey::ManifestSkinUrl => "manifest.skin_url",
            ConfigKey::ManifestSkinThemeUrl => "manifest.skin_theme_url",
            ConfigKey::ManifestViewerScript => "manifest.viewer_script",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "cube").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "size").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or("")
    }

    /// Get the current value from a config as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::CubeSize => config.cube.size.to_string(),
            ConfigKey::CubeStrategy => config.cube.strategy.to_string(),
            ConfigKey::CubeWorkers => config.cube.workers.to_string(),
            ConfigKey::CubeMaxSourceWidth => config.cube.max_source_width.to_string(),
            ConfigKey::CubeMaxSourceHeight => config.cube.max_source_height.to_string(),
            ConfigKey::CubeDownsampleWidth => config.cube.downsample_width.to_string(),
            ConfigKey::CubeDownsampleHeight => config.cube.downsample_height.to_string(),
            ConfigKey::OutputDirectory => path_to_display(&config.output.directory),
            ConfigKey::OutputFaceQuality => config.output.face_quality.to_string(),
            ConfigKey::OutputPreviewQuality => config.output.preview_quality.to_string(),
            ConfigKey::OutputThumbQuality => config.output.thumb_quality.to_string(),
            ConfigKey::OutputPreviewWidth => config.output.preview_width.to_string(),
            ConfigKey::OutputPreviewHeight => config.output.preview_height.to_string(),
            ConfigKey::OutputThumbSize => config.output.thumb_size.to_string(),
            ConfigKey::BatchMaxScenesPerRun => config.batch.max_scenes_per_run.to_string(),
            ConfigKey::FetchUploadsDirectory => path_to_display(&config.fetch.uploads_directory),
            ConfigKey::FetchMaxRetries => config.fetch.max_retries.to_string(),
            ConfigKey::FetchBackoffSecs => config.fetch.backoff_secs.to_string(),
            ConfigKey::FetchTimeout => config.fetch.timeout.to_string(),
            ConfigKey::FetchLargeFileThreshold => format_size(config.fetch.large_file_threshold),
            ConfigKey::FetchLargeFilePattern => {
                config.fetch.large_file_pattern.clone().unwrap_or_default()
            }
            ConfigKey::FetchApiKey => config.fetch.api_key.clone().unwrap_or_default(),
            ConfigKey::FetchCleanupDownloads => config.fetch.cleanup_downloads.to_string(),
            ConfigKey::LedgerFile => path_to_display(&config.ledger.file),
            ConfigKey::ManifestXmlFile => config.manifest.xml_file.clone(),
            ConfigKey::ManifestHtmlFile => config.manifest.html_file.clone(),
            ConfigKey::ManifestSkinUrl => config.manifest.skin_url.clone(),
            ConfigKey::ManifestSkinThemeUrl => config.manifest.skin_theme_url.clone(),
            ConfigKey::ManifestViewerScript => config.manifest.viewer_script.clone(),
            ConfigKey::LoggingFile => path_to_display(&config.logging.file),
        }
    }

    /// Validate `value` and apply it to `config`.
    ///
    /// On error the config is left untouched.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let value = value.trim();
        self.validate(value)?;

        match self {
            ConfigKey::CubeSize => config.cube.size = self.parse(value)?,
            ConfigKey::CubeStrategy => config.cube.strategy = self.parse(value)?,
            ConfigKey::CubeWorkers => config.cube.workers = self.parse(value)?,
            ConfigKey::CubeMaxSourceWidth => config.cube.max_source_width = self.parse(value)?,
            ConfigKey::CubeMaxSourceHeight => config.cube.max_source_height = self.parse(value)?,
            ConfigKey::CubeDownsampleWidth => config.cube.downsample_width = self.parse(value)?,
            ConfigKey::CubeDownsampleHeight => {
                config.cube.downsample_height = self.parse(value)?
            }
            ConfigKey::OutputDirectory => config.output.directory = expand_tilde(value),
            ConfigKey::OutputFaceQuality => config.output.face_quality = self.parse(value)?,
            ConfigKey::OutputPreviewQuality => config.output.preview_quality = self.parse(value)?,
            ConfigKey::OutputThumbQuality => config.output.thumb_quality = self.parse(value)?,
            ConfigKey::OutputPreviewWidth => config.output.preview_width = self.parse(value)?,
            ConfigKey::OutputPreviewHeight => config.output.preview_height = self.parse(value)?,
            ConfigKey::OutputThumbSize => config.output.thumb_size = self.parse(value)?,
            ConfigKey::BatchMaxScenesPerRun => {
                config.batch.max_scenes_per_run = self.parse(value)?
            }
            ConfigKey::FetchUploadsDirectory => {
                config.fetch.uploads_directory = expand_tilde(value)
            }
            ConfigKey::FetchMaxRetries => config.fetch.max_retries = self.parse(value)?,
            ConfigKey::FetchBackoffSecs => config.fetch.backoff_secs = self.parse(value)?,
            ConfigKey::FetchTimeout => config.fetch.timeout = self.parse(value)?,
            ConfigKey::FetchLargeFileThreshold => {
                config.fetch.large_file_threshold =
                    parse_size(value).map_err(|e| self.invalid(e.to_string()))?
            }
            ConfigKey::FetchLargeFilePattern => {
                config.fetch.large_file_pattern = optional_string(value)
            }
            ConfigKey::FetchApiKey => config.fetch.api_key = optional_string(value),
            ConfigKey::FetchCleanupDownloads => config.fetch.cleanup_downloads = is_truthy(value),
            ConfigKey::LedgerFile => config.ledger.file = expand_tilde(value),
            ConfigKey::ManifestXmlFile => config.manifest.xml_file = value.to_string(),
            ConfigKey::ManifestHtmlFile => config.manifest.html_file = value.to_string(),
            ConfigKey::ManifestSkinUrl => config.manifest.skin_url = value.to_string(),
            ConfigKey::ManifestSkinThemeUrl => config.manifest.skin_theme_url = value.to_string(),
            ConfigKey::ManifestViewerScript => config.manifest.viewer_script = value.to_string(),
            ConfigKey::LoggingFile => config.logging.file = expand_tilde(value),
        }
        Ok(())
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value)
            .map_err(|reason| self.invalid(reason))
    }

    /// All keys, in config file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::CubeSize,
            ConfigKey::CubeStrategy,
            ConfigKey::CubeWorkers,
            ConfigKey::CubeMaxSourceWidth,
            ConfigKey::CubeMaxSourceHeight,
            ConfigKey::CubeDownsampleWidth,
            ConfigKey::CubeDownsampleHeight,
            ConfigKey::OutputDirectory,
            ConfigKey::OutputFaceQuality,
            ConfigKey::OutputPreviewQuality,
            ConfigKey::OutputThumbQuality,
            ConfigKey::OutputPreviewWidth,
            ConfigKey::OutputPreviewHeight,
            ConfigKey::OutputThumbSize,
            ConfigKey::BatchMaxScenesPerRun,
            ConfigKey::FetchUploadsDirectory,
            ConfigKey::FetchMaxRetries,
            ConfigKey::FetchBackoffSecs,
            ConfigKey::FetchTimeout,
            ConfigKey::FetchLargeFileThreshold,
            ConfigKey::FetchLargeFilePattern,
            ConfigKey::FetchApiKey,
            ConfigKey::FetchCleanupDownloads,
            ConfigKey::LedgerFile,
            ConfigKey::ManifestXmlFile,
            ConfigKey::ManifestHtmlFile,
            ConfigKey::ManifestSkinUrl,
            ConfigKey::ManifestSkinThemeUrl,
            ConfigKey::ManifestViewerScript,
            ConfigKey::LoggingFile,
        ]
    }

    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::CubeStrategy => Box::new(OneOfSpec::new(&["parallel", "sequential"])),
            ConfigKey::CubeSize
            | ConfigKey::CubeMaxSourceWidth
            | ConfigKey::CubeMaxSourceHeight
            | ConfigKey::CubeDownsampleWidth
            | ConfigKey::CubeDownsampleHeight
            | ConfigKey::OutputPreviewWidth
            | ConfigKey::OutputPreviewHeight
            | ConfigKey::OutputThumbSize
            | ConfigKey::FetchTimeout => Box::new(PositiveIntegerSpec),
            ConfigKey::CubeWorkers
            | ConfigKey::BatchMaxScenesPerRun
            | ConfigKey::FetchMaxRetries
            | ConfigKey::FetchBackoffSecs => Box::new(CountSpec),
            ConfigKey::OutputFaceQuality
            | ConfigKey::OutputPreviewQuality
            | ConfigKey::OutputThumbQuality => Box::new(QualitySpec),
            ConfigKey::FetchLargeFileThreshold => Box::new(SizeSpec),
            ConfigKey::FetchLargeFilePattern => Box::new(OptionalRegexSpec),
            ConfigKey::FetchApiKey => Box::new(AnyStringSpec),
            ConfigKey::FetchCleanupDownloads => Box::new(BooleanSpec),
            ConfigKey::OutputDirectory
            | ConfigKey::FetchUploadsDirectory
            | ConfigKey::LedgerFile
            | ConfigKey::LoggingFile
            | ConfigKey::ManifestXmlFile
            | ConfigKey::ManifestHtmlFile => Box::new(PathSpec),
            ConfigKey::ManifestSkinUrl
            | ConfigKey::ManifestSkinThemeUrl
            | ConfigKey::ManifestViewerScript => Box::new(NonEmptySpec),
        }
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigKeyError> {
        value
            .parse()
            .map_err(|_| self.invalid(format!("cannot parse '{}'", value)))
    }

    fn invalid(&self, reason: impl Into<String>) -> ConfigKeyError {
        ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Value Specifications
// ============================================================================

trait ValueSpecification {
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

struct AnyStringSpec;

impl ValueSpecification for AnyStringSpec {
    fn is_satisfied_by(&self, _value: &str) -> Result<(), String> {
        Ok(())
    }
}

struct OneOfSpec {
    options: &'static [&'static str],
}

impl OneOfSpec {
    fn new(options: &'static [&'static str]) -> Self {
        Self { options }
    }
}

impl ValueSpecification for OneOfSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        if self.options.iter().any(|opt| *opt == lower) {
            Ok(())
        } else {
            Err(format!("must be one of: {}", self.options.join(", ")))
        }
    }
}

struct SizeSpec;

impl ValueSpecification for SizeSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        parse_size(value)
            .map(|_| ())
            .map_err(|_| "must be a size like '2GB', '500MB', or '1024KB'".to_string())
    }
}

/// Integers greater than zero.
struct PositiveIntegerSpec;

impl ValueSpecification for PositiveIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u32>() {
            Ok(n) if n > 0 => Ok(()),
            _ => Err("must be a positive integer".to_string()),
        }
    }
}

/// Integers including zero.
struct CountSpec;

impl ValueSpecification for CountSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        value
            .parse::<u32>()
            .map(|_| ())
            .map_err(|_| "must be zero or a positive integer".to_string())
    }
}

struct QualitySpec;

impl ValueSpecification for QualitySpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u8>() {
            Ok(q) if (1..=100).contains(&q) => Ok(()),
            _ => Err("must be a JPEG quality between 1 and 100".to_string()),
        }
    }
}

struct BooleanSpec;

impl ValueSpecification for BooleanSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        let valid = ["true", "false", "yes", "no", "1", "0", "on", "off"];
        if valid.contains(&lower.as_str()) {
            Ok(())
        } else {
            Err("must be true/false, yes/no, 1/0, or on/off".to_string())
        }
    }
}

struct PathSpec;

impl ValueSpecification for PathSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err("must be a valid path".to_string())
        } else {
            Ok(())
        }
    }
}

struct NonEmptySpec;

impl ValueSpecification for NonEmptySpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err("must not be empty".to_string())
        } else {
            Ok(())
        }
    }
}

/// Empty disables the pattern; anything else must compile.
struct OptionalRegexSpec;

impl ValueSpecification for OptionalRegexSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Ok(());
        }
        Regex::new(value)
            .map(|_| ())
            .map_err(|e| format!("must be a valid regular expression ({})", e))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert path to display string, collapsing home dir to ~.
fn path_to_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

/// Convert empty string to None, non-empty to Some.
fn optional_string(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "yes" | "1" | "on")
}
