//! Job service.
//!
//! [`JobRunner`] drives a job through intake (saving uploads or fetching
//! remote files), conversion and manifest emission, keeping the
//! [`JobLedger`](crate::ledger::JobLedger) entry current at every stage.

mod error;
mod layout;
mod runner;
mod tracker;

pub use error::JobError;
pub use layout::{sanitize_file_name, sanitize_project_name, ProjectLayout};
pub use runner::{JobRunner, JobSummary};
pub use tracker::JobTracker;
