//! Error types for the cube pipeline.
//!
//! Every variant is fatal for the scene being converted. None of them abort
//! a batch: the coordinator records the failure and moves on.

use std::path::PathBuf;

use thiserror::Error;

use crate::render::RenderError;

/// Errors that can occur while converting one panorama.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source image could not be read or decoded.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A face could not be rendered.
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// A face, preview or thumbnail could not be written.
    #[error("failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Filesystem operation on the scene directory failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The face worker pool could not be created.
    #[error("failed to build face worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl PipelineError {
    /// Short category name used in failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Render(_) => "render",
            Self::Persist { .. } => "persist",
            Self::Io { .. } => "io",
            Self::WorkerPool(_) => "worker_pool",
        }
    }
}
