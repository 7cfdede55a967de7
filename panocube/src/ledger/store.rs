//! Ledger storage backends.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::warn;

use super::{JobId, JobRecord, LedgerError};

/// Full ledger contents, keyed by job id.
pub type JobMap = BTreeMap<JobId, JobRecord>;

/// Durable storage for the ledger.
///
/// Every mutation rewrites the whole map. A backend assumes a single writer
/// process; two processes sharing one ledger file need external locking.
pub trait LedgerBackend: Send + Sync {
    /// Reads the persisted map; a missing store is an empty map.
    fn load(&self) -> Result<JobMap, LedgerError>;

    /// Replaces the persisted map with `jobs`.
    fn persist(&self, jobs: &JobMap) -> Result<(), LedgerError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// JSON file backend, replaced atomically through a sibling temp file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable ledger file is moved before starting afresh.
    pub fn quarantine_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    /// Moves the unreadable ledger aside so the next persist starts from an
    /// empty map without losing the old contents.
    fn quarantine(&self, reason: &serde_json::Error) {
        let target = self.quarantine_path();
        match std::fs::rename(&self.path, &target) {
            Ok(()) => warn!(
                path = %self.path.display(),
                moved_to = %target.display(),
                error = %reason,
                "Job ledger unreadable, moved aside and starting empty"
            ),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %reason,
                rename_error = %e,
                "Job ledger unreadable and could not be moved aside, starting empty"
            ),
        }
    }

    fn io_err(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl LedgerBackend for JsonFileBackend {
    /// A file that does not parse is quarantined and loads as empty.
    fn load(&self) -> Result<JobMap, LedgerError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(JobMap::new()),
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(jobs) => Ok(jobs),
                Err(e) => {
                    self.quarantine(&e);
                    Ok(JobMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(JobMap::new()),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn persist(&self, jobs: &JobMap) -> Result<(), LedgerError> {
        let json = serde_json::to_vec_pretty(jobs)?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| self.io_err(e))?;
        temp.write_all(&json).map_err(|e| self.io_err(e))?;
        temp.as_file_mut().sync_all().map_err(|e| self.io_err(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.io_err(e.error))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory backend for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    stored: Mutex<JobMap>,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with `jobs`, as if left by an earlier process.
    pub fn with_jobs(jobs: JobMap) -> Self {
        Self {
            stored: Mutex::new(jobs),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of persists so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Copy of what is currently persisted.
    pub fn stored(&self) -> JobMap {
        self.stored.lock().clone()
    }
}

impl LedgerBackend for MemoryBackend {
    fn load(&self) -> Result<JobMap, LedgerError> {
        Ok(self.stored.lock().clone())
    }

    fn persist(&self, jobs: &JobMap) -> Result<(), LedgerError> {
        *self.stored.lock() = jobs.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
