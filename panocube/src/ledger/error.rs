//! Job ledger errors.

use std::path::PathBuf;

use thiserror::Error;

use super::{JobId, JobStatus};

/// Errors that can occur while reading or mutating the job ledger.
///
/// A failed persist leaves the in-memory state already mutated; callers
/// treat it as lost durability, not as a failed mutation.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    #[error("job {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
}
