//! Job runner error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::ledger::JobId;
use crate::manifest::ManifestError;

/// Errors that end a job.
#[derive(Debug, Error)]
pub enum JobError {
    /// The project name is empty once path separators and leading dots
    /// are removed.
    #[error("invalid project name '{0}'")]
    InvalidProject(String),

    /// No input files were given.
    #[error("no input files")]
    NoInputs,

    /// Every input failed; nothing to put in a manifest.
    #[error("job {job_id} produced no scenes (failed: {})", .failed.join(", "))]
    NothingProcessed { job_id: JobId, failed: Vec<String> },

    /// Staging directory or staged file could not be written.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The blocking conversion task panicked or was cancelled.
    #[error("conversion worker failed: {0}")]
    Worker(String),
}

impl JobError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
