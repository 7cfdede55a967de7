//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list` and `config path`
//! commands for viewing and modifying configuration settings from the
//! command line.

use clap::Subcommand;
use panocube::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., cube.size)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., cube.size)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'panocube config list' to see available keys.",
            key
        ))
    })
}

fn run_get(key: &str) -> Result<(), CliError> {
    let value = parse_key(key)?.get(&ConfigFile::load()?);
    println!("{}", if value.is_empty() { "(not set)" } else { value.as_str() });
    Ok(())
}

/// Set a configuration value.
///
/// A config file that fails to load is not overwritten with defaults.
fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let mut config = ConfigFile::load()?;
    config_key
        .set(&mut config, value)
        .map_err(|e| CliError::Config(e.to_string()))?;
    config.save()?;

    println!("Set {} = {}", config_key.name(), value.trim());

    Ok(())
}

/// Print every key grouped by section. Values changed from their default
/// are marked with `*`.
fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let defaults = ConfigFile::default();

    println!("Configuration Settings");
    println!("======================");

    let mut section = "";
    let mut changed = 0usize;
    for key in ConfigKey::all() {
        if key.section() != section {
            section = key.section();
            println!();
            println!("[{}]", section);
        }

        let value = key.get(&config);
        let marker = if value != key.get(&defaults) {
            changed += 1;
            "*"
        } else {
            " "
        };
        let shown = if value.is_empty() { "(not set)" } else { value.as_str() };
        println!(" {} {} = {}", marker, key.key_name(), shown);
    }

    println!();
    println!(
        "{} of {} settings changed from defaults ({})",
        changed,
        ConfigKey::all().len(),
        config_file_path().display()
    );

    Ok(())
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}
