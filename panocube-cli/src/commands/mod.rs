//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`convert`] - Convert local panoramas into a project
//! - [`fetch`] - Download remote panoramas and convert them
//! - [`jobs`] - Inspect and discard leftover jobs

pub mod common;
pub mod config;
pub mod convert;
pub mod fetch;
pub mod jobs;
