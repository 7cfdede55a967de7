//! Ledger bookkeeping for one running job.
//!
//! Ledger write failures never end a job: the in-memory record stays
//! current and the loss of durability is logged.

use std::sync::Arc;

use tracing::warn;

use crate::ledger::{JobId, JobKind, JobLedger, JobRecord, JobStatus};

/// Handle on one job's ledger entry.
#[derive(Clone)]
pub struct JobTracker {
    ledger: Arc<JobLedger>,
    id: JobId,
}

impl JobTracker {
    /// Registers a new job of `kind` in `starting`.
    pub fn register(
        ledger: Arc<JobLedger>,
        kind: JobKind,
        project: &str,
        total_files: usize,
    ) -> Self {
        let id = JobId::generate(kind);
        if let Err(e) = ledger.register(id.clone(), JobRecord::new(kind, project, total_files)) {
            warn!(job_id = %id, error = %e, "Ledger write failed while registering job");
        }
        Self { ledger, id }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Current record, if the job is still registered.
    pub fn record(&self) -> Option<JobRecord> {
        self.ledger.get(&self.id)
    }

    pub fn advance(&self, status: JobStatus) {
        if let Err(e) = self.ledger.advance(&self.id, status) {
            warn!(job_id = %self.id, status = %status, error = %e, "Ledger status update failed");
        }
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut JobRecord),
    {
        if let Err(e) = self.ledger.update(&self.id, f) {
            warn!(job_id = %self.id, error = %e, "Ledger update failed");
        }
    }

    pub fn fail(&self, message: &str) {
        if let Err(e) = self.ledger.fail(&self.id, message) {
            warn!(job_id = %self.id, error = %e, "Ledger write failed while failing job");
        }
    }

    /// Removes the entry of a job that reached a terminal status.
    pub fn finish(&self) -> Option<JobRecord> {
        match self.ledger.unregister(&self.id) {
            Ok(record) => record,
            Err(e) => {
                warn!(job_id = %self.id, error = %e, "Ledger write failed while unregistering job");
                None
            }
        }
    }
}

impl std::fmt::Debug for JobTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobTracker").field("id", &self.id).finish()
    }
}
