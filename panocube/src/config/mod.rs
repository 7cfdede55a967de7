//! User configuration.
//!
//! `~/.panocube/config.ini` is split into one section per component. The
//! file is loaded into [`ConfigFile`], edited through [`ConfigKey`] and
//! converted into the component configs with
//! [`ConfigFile::pipeline_config`], [`ConfigFile::fetch_config`] and
//! [`ConfigFile::manifest_settings`].

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::{
    default_ledger_file, default_log_file, default_output_directory, default_uploads_directory,
    CONFIG_DIR_NAME, DEFAULT_BACKOFF_SECS, DEFAULT_FETCH_TIMEOUT_SECS,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    BatchSettings, ConfigFile, CubeSettings, FetchSettings, LedgerSettings, LoggingSettings,
    ManifestFileSettings, OutputSettings,
};
pub use size::{format_size, parse_size, SizeParseError};
