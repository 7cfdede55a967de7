//! Job identity, kind, status and the persisted record.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Identifier of a ledger entry.
///
/// Unique across process restarts: a timestamp, the process id and an
/// in-process sequence number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generates a fresh id for a job of `kind`.
    pub fn generate(kind: JobKind) -> Self {
        let seq = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "{}-{}-{}-{}",
            kind.prefix(),
            Utc::now().format("%Y%m%d%H%M%S"),
            std::process::id(),
            seq
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a job's inputs come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Files handed to the process directly.
    DirectUpload,
    /// Files fetched from the remote drive service.
    GdriveFetch,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectUpload => "direct_upload",
            Self::GdriveFetch => "gdrive_fetch",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Self::DirectUpload => "upload",
            Self::GdriveFetch => "fetch",
        }
    }

    /// Input stage that follows `starting` for this kind.
    pub fn intake_status(&self) -> JobStatus {
        match self {
            Self::DirectUpload => JobStatus::SavingUploads,
            Self::GdriveFetch => JobStatus::Downloading,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job lifecycle status.
///
/// ```text
/// starting → saving_uploads | downloading → processing → finalizing → completed
///     └──────────────┴─────────────────────────┴────────────┴──────→ error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Starting,
    SavingUploads,
    Downloading,
    Processing,
    Finalizing,
    Completed,
    Error,
}

impl JobStatus {
    /// Position in the lifecycle; transitions never decrease it.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::SavingUploads | Self::Downloading => 1,
            Self::Processing => 2,
            Self::Finalizing => 3,
            Self::Completed | Self::Error => 4,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Whether a job of `kind` may move from `self` to `next`.
    ///
    /// Staying in the same non-terminal status is allowed. The intake stage
    /// must match the job kind.
    pub fn can_transition_to(&self, next: JobStatus, kind: JobKind) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobStatus::Error || next == *self {
            return true;
        }
        if next.rank() == 1 && next != kind.intake_status() {
            return false;
        }
        next.rank() > self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::SavingUploads => "saving_uploads",
            Self::Downloading => "downloading",
            Self::Processing => "processing",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger entry as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub project_name: String,
    #[serde(default)]
    pub total_files: usize,
    /// Files saved or downloaded into the staging directory.
    #[serde(default)]
    pub staged_files: usize,
    #[serde(default)]
    pub processed_files: usize,
    #[serde(default)]
    pub failed_files: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    /// A fresh record in `starting`.
    pub fn new(kind: JobKind, project_name: impl Into<String>, total_files: usize) -> Self {
        let now = Utc::now();
        Self {
            kind,
            status: JobStatus::Starting,
            started_at: now,
            updated_at: now,
            project_name: project_name.into(),
            total_files,
            staged_files: 0,
            processed_files: 0,
            failed_files: 0,
            current_file: None,
            error: None,
        }
    }
}
