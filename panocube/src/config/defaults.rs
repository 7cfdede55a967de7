//! Default values for all configuration settings.
//!
//! Contains the `DEFAULT_*` constants not owned by a component module and
//! the `Default` implementations of the settings structs.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::fetch::{DEFAULT_LARGE_FILE_THRESHOLD, DEFAULT_MAX_RETRIES};
use crate::manifest::{
    DEFAULT_HTML_FILE, DEFAULT_SKIN_THEME_URL, DEFAULT_SKIN_URL, DEFAULT_VIEWER_SCRIPT,
    DEFAULT_XML_FILE,
};
use crate::pipeline::{PipelineConfig, RenderStrategy, DEFAULT_CUBE_SIZE};

/// Name of the per-user state directory under `$HOME`.
pub const CONFIG_DIR_NAME: &str = ".panocube";

/// Default linear backoff step between fetch attempts, in seconds.
pub const DEFAULT_BACKOFF_SECS: u64 = 5;

/// Default per-request fetch timeout, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 600;

pub fn default_output_directory() -> PathBuf {
    config_directory().join("output")
}

pub fn default_uploads_directory() -> PathBuf {
    config_directory().join("uploads")
}

pub fn default_ledger_file() -> PathBuf {
    config_directory().join("jobs.json")
}

pub fn default_log_file() -> PathBuf {
    config_directory().join("panocube.log")
}

impl Default for CubeSettings {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            size: DEFAULT_CUBE_SIZE,
            strategy: RenderStrategy::Parallel,
            workers: 0,
            max_source_width: pipeline.max_source_width,
            max_source_height: pipeline.max_source_height,
            downsample_width: pipeline.downsample_width,
            downsample_height: pipeline.downsample_height,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            directory: default_output_directory(),
            face_quality: pipeline.face_quality,
            preview_quality: pipeline.preview_quality,
            thumb_quality: pipeline.thumb_quality,
            preview_width: pipeline.preview_width,
            preview_height: pipeline.preview_height,
            thumb_size: pipeline.thumb_size,
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_scenes_per_run: 0,
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            uploads_directory: default_uploads_directory(),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_secs: DEFAULT_BACKOFF_SECS,
            timeout: DEFAULT_FETCH_TIMEOUT_SECS,
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            large_file_pattern: None,
            api_key: None,
            cleanup_downloads: true,
        }
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            file: default_ledger_file(),
        }
    }
}

impl Default for ManifestFileSettings {
    fn default() -> Self {
        Self {
            xml_file: DEFAULT_XML_FILE.to_string(),
            html_file: DEFAULT_HTML_FILE.to_string(),
            skin_url: DEFAULT_SKIN_URL.to_string(),
            skin_theme_url: DEFAULT_SKIN_THEME_URL.to_string(),
            viewer_script: DEFAULT_VIEWER_SCRIPT.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cube: CubeSettings::default(),
            output: OutputSettings::default(),
            batch: BatchSettings::default(),
            fetch: FetchSettings::default(),
            ledger: LedgerSettings::default(),
            manifest: ManifestFileSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
