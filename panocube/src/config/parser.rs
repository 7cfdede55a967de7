//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! Values are applied through [`ConfigKey::set`], so file values and
//! `config set` share one set of validation rules.

use std::path::PathBuf;

use ini::Ini;
use tracing::warn;

use super::file::ConfigFileError;
use super::keys::{ConfigKey, ConfigKeyError};
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the
/// INI. Empty values keep the default. Unknown keys are logged and ignored.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    for (section, properties) in ini.iter() {
        let Some(section) = section else { continue };

        for (key_name, value) in properties.iter() {
            let name = format!("{}.{}", section, key_name);
            let key = match name.parse::<ConfigKey>() {
                Ok(key) => key,
                Err(_) => {
                    warn!(key = %name, "Ignoring unknown configuration key");
                    continue;
                }
            };

            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            key.set(&mut config, value)
                .map_err(|e| ConfigFileError::InvalidValue {
                    section: section.to_string(),
                    key: key_name.to_string(),
                    value: value.to_string(),
                    reason: match e {
                        ConfigKeyError::ValidationFailed { reason, .. } => reason,
                        other => other.to_string(),
                    },
                })?;
        }
    }

    Ok(config)
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RenderStrategy;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(text).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_values_overlay_defaults() {
        let config = parse(
            "[cube]\nsize = 1024\nstrategy = sequential\n\n[batch]\nmax_scenes_per_run = 3\n\n[fetch]\nlarge_file_threshold = 2GB\n",
        )
        .unwrap();

        assert_eq!(config.cube.size, 1024);
        assert_eq!(config.cube.strategy, RenderStrategy::Sequential);
        assert_eq!(config.batch.max_scenes_per_run, 3);
        assert_eq!(config.fetch.large_file_threshold, 2 * 1024 * 1024 * 1024);
        assert_eq!(config.output, ConfigFile::default().output);
    }

    #[test]
    fn test_empty_value_keeps_default() {
        let config = parse("[ledger]\nfile =\n").unwrap();
        assert_eq!(config.ledger, ConfigFile::default().ledger);
    }

    #[test]
    fn test_invalid_value_names_section_and_key() {
        let err = parse("[output]\nthumb_quality = 0\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue {
                section,
                key,
                value,
                ..
            } => {
                assert_eq!(section, "output");
                assert_eq!(key, "thumb_quality");
                assert_eq!(value, "0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = parse("[cube]\ncolour = blue\n[elsewhere]\nx = 1\n").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/out"), home.join("out"));
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
