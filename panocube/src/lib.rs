//! panocube - equirectangular panorama to cubemap conversion
//!
//! This library converts 360° equirectangular panoramas into the six faces
//! of a cube map, composes preview strips and thumbnails, and writes the
//! scene graph consumed by the panorama viewer.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module runs complete jobs:
//!
//! ```ignore
//! use std::sync::Arc;
//! use panocube::ledger::JobLedger;
//! use panocube::pipeline::{CubePipeline, PipelineConfig};
//! use panocube::service::{JobRunner, ProjectLayout};
//!
//! let pipeline = Arc::new(CubePipeline::new(PipelineConfig::default())?);
//! let ledger = Arc::new(JobLedger::open("jobs.json")?);
//! let runner = JobRunner::new(ledger, pipeline, ProjectLayout::new("output", "uploads"));
//!
//! let summary = runner.run_upload("villa", &inputs).await?;
//! ```

pub mod batch;
pub mod config;
pub mod fetch;
pub mod geometry;
pub mod ledger;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod render;
pub mod service;

/// Version of the panocube library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
