//! Recovery of jobs left behind by an earlier process.
//!
//! Recovery is reporting only. Uploaded bytes do not survive a restart, and
//! resuming remote fetches is not implemented, so a leftover job can only be
//! listed and discarded.

use std::fmt;

use serde::Serialize;

use super::{JobId, JobKind, JobRecord};

/// What can be done about a leftover job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryDisposition {
    /// The uploaded inputs were lost with the process.
    NotResumable,
    /// The inputs could be fetched again, but resuming is not implemented.
    ResumeNotImplemented,
}

impl RecoveryDisposition {
    pub fn for_kind(kind: JobKind) -> Self {
        match kind {
            JobKind::DirectUpload => Self::NotResumable,
            JobKind::GdriveFetch => Self::ResumeNotImplemented,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::NotResumable => "not automatically resumable (uploaded files are gone)",
            Self::ResumeNotImplemented => "resume of remote fetch jobs is not implemented yet",
        }
    }
}

impl fmt::Display for RecoveryDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A leftover job and its disposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryNote {
    pub id: JobId,
    pub record: JobRecord,
    pub disposition: RecoveryDisposition,
}

impl RecoveryNote {
    pub fn new(id: JobId, record: JobRecord) -> Self {
        let disposition = RecoveryDisposition::for_kind(record.kind);
        Self {
            id,
            record,
            disposition,
        }
    }
}
