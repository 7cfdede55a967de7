//! Durable job ledger.
//!
//! The ledger maps job ids to [`JobRecord`]s and rewrites its backend after
//! every mutation. It is injected into the job runner instead of living in a
//! process-wide global.
//!
//! Terminal jobs are not retained: the runner unregisters a job once it is
//! `completed` or `error`. Anything still present when a new process opens
//! the ledger was interrupted and is reported through [`JobLedger::leftovers`].

mod error;
mod job;
mod recovery;
mod store;

pub use error::LedgerError;
pub use job::{JobId, JobKind, JobRecord, JobStatus};
pub use recovery::{RecoveryDisposition, RecoveryNote};
pub use store::{JobMap, JsonFileBackend, LedgerBackend, MemoryBackend};

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Thread-safe job ledger over a [`LedgerBackend`].
pub struct JobLedger {
    jobs: Mutex<JobMap>,
    /// Ids loaded at open time, i.e. left by an earlier process.
    inherited: Mutex<BTreeSet<JobId>>,
    backend: Box<dyn LedgerBackend>,
}

impl JobLedger {
    /// Opens a JSON ledger file, loading any existing entries.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        Self::with_backend(Box::new(JsonFileBackend::new(path)))
    }

    /// A ledger that persists nowhere.
    pub fn in_memory() -> Self {
        Self {
            jobs: Mutex::new(JobMap::new()),
            inherited: Mutex::new(BTreeSet::new()),
            backend: Box::new(MemoryBackend::new()),
        }
    }

    /// Opens a ledger over `backend`, loading its current contents.
    pub fn with_backend(backend: Box<dyn LedgerBackend>) -> Result<Self, LedgerError> {
        let jobs = backend.load()?;
        let inherited: BTreeSet<JobId> = jobs.keys().cloned().collect();

        if inherited.is_empty() {
            debug!(store = %backend.describe(), "Job ledger opened");
        } else {
            warn!(
                store = %backend.describe(),
                leftover = inherited.len(),
                "Job ledger contains jobs from a previous run"
            );
        }

        Ok(Self {
            jobs: Mutex::new(jobs),
            inherited: Mutex::new(inherited),
            backend,
        })
    }

    /// Adds a job and persists.
    pub fn register(&self, id: JobId, record: JobRecord) -> Result<(), LedgerError> {
        let mut jobs = self.jobs.lock();
        info!(
            job_id = %id,
            kind = %record.kind,
            project = %record.project_name,
            "Job registered"
        );
        jobs.insert(id, record);
        self.backend.persist(&jobs)
    }

    /// Mutates a job in place and persists.
    ///
    /// `f` must not change the status; use [`JobLedger::advance`] for that.
    pub fn update<F>(&self, id: &JobId, f: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut jobs = self.jobs.lock();
        let record = jobs
            .get_mut(id)
            .ok_or_else(|| LedgerError::UnknownJob(id.clone()))?;
        let status = record.status;
        f(record);
        record.status = status;
        record.updated_at = Utc::now();
        self.backend.persist(&jobs)
    }

    /// Moves a job to `status` and persists.
    ///
    /// Backward moves and moves out of a terminal status are rejected
    /// without touching the ledger.
    pub fn advance(&self, id: &JobId, status: JobStatus) -> Result<(), LedgerError> {
        let mut jobs = self.jobs.lock();
        let record = jobs
            .get_mut(id)
            .ok_or_else(|| LedgerError::UnknownJob(id.clone()))?;

        if !record.status.can_transition_to(status, record.kind) {
            return Err(LedgerError::InvalidTransition {
                id: id.clone(),
                from: record.status,
                to: status,
            });
        }

        debug!(job_id = %id, from = %record.status, to = %status, "Job status changed");
        record.status = status;
        record.updated_at = Utc::now();
        self.backend.persist(&jobs)
    }

    /// Moves a job to `error` with `message` and persists.
    pub fn fail(&self, id: &JobId, message: impl Into<String>) -> Result<(), LedgerError> {
        let mut jobs = self.jobs.lock();
        let record = jobs
            .get_mut(id)
            .ok_or_else(|| LedgerError::UnknownJob(id.clone()))?;

        if record.status.is_terminal() {
            return Err(LedgerError::InvalidTransition {
                id: id.clone(),
                from: record.status,
                to: JobStatus::Error,
            });
        }

        record.status = JobStatus::Error;
        record.error = Some(message.into());
        record.updated_at = Utc::now();
        self.backend.persist(&jobs)
    }

    /// Removes a job and persists. Returns the removed record.
    pub fn unregister(&self, id: &JobId) -> Result<Option<JobRecord>, LedgerError> {
        let mut jobs = self.jobs.lock();
        let removed = jobs.remove(id);
        self.inherited.lock().remove(id);
        if removed.is_some() {
            debug!(job_id = %id, "Job unregistered");
        }
        self.backend.persist(&jobs)?;
        Ok(removed)
    }

    pub fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.jobs.lock().get(id).cloned()
    }

    /// Copy of every entry.
    pub fn snapshot(&self) -> JobMap {
        self.jobs.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Rewrites the backend from memory. Used on shutdown.
    pub fn flush(&self) -> Result<(), LedgerError> {
        let jobs = self.jobs.lock();
        self.backend.persist(&jobs)
    }

    /// Jobs left by an earlier process that are still in the ledger.
    pub fn leftovers(&self) -> Vec<RecoveryNote> {
        let jobs = self.jobs.lock();
        let inherited = self.inherited.lock();
        inherited
            .iter()
            .filter_map(|id| {
                jobs.get(id)
                    .map(|record| RecoveryNote::new(id.clone(), record.clone()))
            })
            .collect()
    }

    /// Removes every leftover job and persists. Returns how many were removed.
    pub fn discard_leftovers(&self) -> Result<usize, LedgerError> {
        let mut jobs = self.jobs.lock();
        let mut inherited = self.inherited.lock();
        let before = jobs.len();
        for id in inherited.iter() {
            jobs.remove(id);
        }
        inherited.clear();
        let removed = before - jobs.len();
        if removed > 0 {
            info!(removed, "Discarded leftover jobs");
        }
        self.backend.persist(&jobs)?;
        Ok(removed)
    }

    /// Where the ledger is persisted.
    pub fn location(&self) -> String {
        self.backend.describe()
    }
}

impl std::fmt::Debug for JobLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobLedger")
            .field("store", &self.backend.describe())
            .field("jobs", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Backend shared with the test so persisted state can be inspected.
    struct Shared(Arc<MemoryBackend>);

    impl LedgerBackend for Shared {
        fn load(&self) -> Result<JobMap, LedgerError> {
            self.0.load()
        }
        fn persist(&self, jobs: &JobMap) -> Result<(), LedgerError> {
            self.0.persist(jobs)
        }
        fn describe(&self) -> String {
            self.0.describe()
        }
    }

    /// Backend whose writes always fail.
    struct Broken;

    impl LedgerBackend for Broken {
        fn load(&self) -> Result<JobMap, LedgerError> {
            Ok(JobMap::new())
        }
        fn persist(&self, _jobs: &JobMap) -> Result<(), LedgerError> {
            Err(LedgerError::Io {
                path: PathBuf::from("/dev/full"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        }
        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    fn shared_ledger() -> (JobLedger, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let ledger = JobLedger::with_backend(Box::new(Shared(Arc::clone(&backend)))).unwrap();
        (ledger, backend)
    }

    #[test]
    fn test_register_update_unregister_leaves_store_empty() {
        let (ledger, backend) = shared_ledger();
        let id = JobId::generate(JobKind::DirectUpload);

        ledger
            .register(id.clone(), JobRecord::new(JobKind::DirectUpload, "villa", 3))
            .unwrap();
        for i in 1..=3 {
            ledger.update(&id, |r| r.processed_files = i).unwrap();
        }
        assert_eq!(backend.stored()[&id].processed_files, 3);

        ledger.unregister(&id).unwrap();

        assert!(backend.stored().is_empty());
        assert!(ledger.is_empty());
        assert_eq!(backend.writes(), 5);
    }

    #[test]
    fn test_every_mutation_persists() {
        let (ledger, backend) = shared_ledger();
        let id = JobId::generate(JobKind::GdriveFetch);
        ledger
            .register(id.clone(), JobRecord::new(JobKind::GdriveFetch, "p", 1))
            .unwrap();
        ledger.advance(&id, JobStatus::Downloading).unwrap();
        ledger.update(&id, |r| r.staged_files = 1).unwrap();

        let stored = backend.stored();
        assert_eq!(stored[&id].status, JobStatus::Downloading);
        assert_eq!(stored[&id].staged_files, 1);
        assert_eq!(backend.writes(), 3);
    }

    #[test]
    fn test_update_cannot_change_status() {
        let ledger = JobLedger::in_memory();
        let id = JobId::from("j");
        ledger
            .register(id.clone(), JobRecord::new(JobKind::DirectUpload, "p", 1))
            .unwrap();
        ledger.update(&id, |r| r.status = JobStatus::Completed).unwrap();
        assert_eq!(ledger.get(&id).unwrap().status, JobStatus::Starting);
    }

    #[test]
    fn test_backward_transition_rejected() {
        let ledger = JobLedger::in_memory();
        let id = JobId::from("j");
        ledger
            .register(id.clone(), JobRecord::new(JobKind::DirectUpload, "p", 1))
            .unwrap();
        ledger.advance(&id, JobStatus::Processing).unwrap();

        let err = ledger.advance(&id, JobStatus::SavingUploads).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransition { .. }));
        assert_eq!(ledger.get(&id).unwrap().status, JobStatus::Processing);
    }

    #[test]
    fn test_fail_records_message() {
        let ledger = JobLedger::in_memory();
        let id = JobId::from("j");
        ledger
            .register(id.clone(), JobRecord::new(JobKind::GdriveFetch, "p", 1))
            .unwrap();
        ledger.fail(&id, "nothing downloaded").unwrap();

        let record = ledger.get(&id).unwrap();
        assert_eq!(record.status, JobStatus::Error);
        assert_eq!(record.error.as_deref(), Some("nothing downloaded"));
        assert!(ledger.fail(&id, "again").is_err());
    }

    #[test]
    fn test_unknown_job() {
        let ledger = JobLedger::in_memory();
        let err = ledger.update(&JobId::from("ghost"), |_| {}).unwrap_err();
        assert!(matches!(err, LedgerError::UnknownJob(_)));
    }

    #[test]
    fn test_persist_failure_keeps_memory_state() {
        let ledger = JobLedger::with_backend(Box::new(Broken)).unwrap();
        let id = JobId::from("j");

        assert!(ledger
            .register(id.clone(), JobRecord::new(JobKind::DirectUpload, "p", 2))
            .is_err());
        assert!(ledger.update(&id, |r| r.staged_files = 2).is_err());

        assert_eq!(ledger.get(&id).unwrap().staged_files, 2);
    }

    #[test]
    fn test_reopen_reports_leftovers() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("jobs.json");

        let upload = JobId::from("upload-1");
        let fetch = JobId::from("fetch-1");
        {
            let ledger = JobLedger::open(&path).unwrap();
            ledger
                .register(upload.clone(), JobRecord::new(JobKind::DirectUpload, "a", 1))
                .unwrap();
            ledger
                .register(fetch.clone(), JobRecord::new(JobKind::GdriveFetch, "b", 1))
                .unwrap();
            ledger.advance(&fetch, JobStatus::Downloading).unwrap();
        }

        let reopened = JobLedger::open(&path).unwrap();
        let notes = reopened.leftovers();
        assert_eq!(notes.len(), 2);
        let by_id = |id: &JobId| notes.iter().find(|n| &n.id == id).unwrap().disposition;
        assert_eq!(by_id(&upload), RecoveryDisposition::NotResumable);
        assert_eq!(by_id(&fetch), RecoveryDisposition::ResumeNotImplemented);

        // New jobs in this process are not leftovers.
        let fresh = JobId::from("upload-2");
        reopened
            .register(fresh.clone(), JobRecord::new(JobKind::DirectUpload, "c", 1))
            .unwrap();
        assert_eq!(reopened.discard_leftovers().unwrap(), 2);
        assert!(reopened.leftovers().is_empty());
        assert!(reopened.get(&fresh).is_some());

        let again = JobLedger::open(&path).unwrap();
        assert_eq!(again.len(), 1);
    }
}
