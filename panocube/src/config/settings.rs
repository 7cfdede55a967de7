//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::pipeline::RenderStrategy;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Cube face rendering
    pub cube: CubeSettings,
    /// Output locations and image encoding
    pub output: OutputSettings,
    /// Batch limits
    pub batch: BatchSettings,
    /// Remote fetch behaviour
    pub fetch: FetchSettings,
    /// Job ledger location
    pub ledger: LedgerSettings,
    /// Viewer manifest files
    pub manifest: ManifestFileSettings,
    /// Logging
    pub logging: LoggingSettings,
}

/// `[cube]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeSettings {
    /// Face side length in pixels
    pub size: u32,
    pub strategy: RenderStrategy,
    /// Face workers; 0 selects min(cpus, 8) capped at 6
    pub workers: usize,
    pub max_source_width: u32,
    pub max_source_height: u32,
    pub downsample_width: u32,
    pub downsample_height: u32,
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// Root under which projects are written
    pub directory: PathBuf,
    pub face_quality: u8,
    pub preview_quality: u8,
    pub thumb_quality: u8,
    pub preview_width: u32,
    pub preview_height: u32,
    pub thumb_size: u32,
}

/// `[batch]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    /// Inputs started per run; 0 means unlimited
    pub max_scenes_per_run: usize,
}

/// `[fetch]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Staging root for uploaded and downloaded inputs
    pub uploads_directory: PathBuf,
    pub max_retries: u32,
    pub backoff_secs: u64,
    /// Per-request timeout in seconds
    pub timeout: u64,
    /// Probed size above which the fallback client is used directly
    pub large_file_threshold: u64,
    /// Regex on file names that marks files as large
    pub large_file_pattern: Option<String>,
    /// Drive API key; enables the size probe
    pub api_key: Option<String>,
    /// Remove the staging directory once a job ends
    pub cleanup_downloads: bool,
}

/// `[ledger]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    pub file: PathBuf,
}

/// `[manifest]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFileSettings {
    pub xml_file: String,
    pub html_file: String,
    pub skin_url: String,
    pub skin_theme_url: String,
    pub viewer_script: String,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}
