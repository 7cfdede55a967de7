//! Job runner.
//!
//! A job moves inputs into the project's staging directory, converts every
//! staged input into a scene, then writes the manifest. The ledger entry
//! follows each stage and is removed once the job is completed or failed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::layout::{sanitize_file_name, sanitize_project_name, ProjectLayout};
use super::tracker::JobTracker;
use super::JobError;
use crate::batch::{
    BatchCoordinator, BatchProgress, BatchProgressCallback, FailedScene, ProcessedScene,
};
use crate::fetch::{Downloader, RemoteFile, ResilientFetcher};
use crate::ledger::{JobId, JobKind, JobLedger, JobStatus};
use crate::manifest::{ManifestEmitter, ManifestPaths};
use crate::pipeline::CubePipeline;

/// Result of a completed job.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub job_id: JobId,
    pub kind: JobKind,
    pub project: String,
    pub project_dir: PathBuf,
    /// Files submitted to the job.
    pub total: usize,
    /// Scenes in manifest order.
    pub processed: Vec<ProcessedScene>,
    pub failed_scenes: Vec<FailedScene>,
    /// Inputs that never reached staging (failed downloads, unusable or
    /// duplicate file names).
    pub failed_files: Vec<String>,
    /// Inputs not started because of the scene limit or a stop request.
    pub deferred: Vec<String>,
    pub manifest: ManifestPaths,
}

impl JobSummary {
    pub fn failed_scene_names(&self) -> Vec<String> {
        self.failed_scenes.iter().map(|s| s.name.clone()).collect()
    }

    /// Whether anything submitted did not end up as a scene.
    pub fn is_partial(&self) -> bool {
        self.processed.len() < self.total
    }
}

/// Inputs that made it into staging, plus what did not.
#[derive(Debug, Default)]
struct Intake {
    inputs: Vec<PathBuf>,
    failed_files: Vec<String>,
    deferred: Vec<String>,
}

/// Runs upload and fetch jobs for projects under one [`ProjectLayout`].
pub struct JobRunner {
    ledger: Arc<JobLedger>,
    pipeline: Arc<CubePipeline>,
    emitter: ManifestEmitter,
    layout: ProjectLayout,
    max_scenes_per_run: usize,
    cleanup_staging: bool,
    stop: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new(ledger: Arc<JobLedger>, pipeline: Arc<CubePipeline>, layout: ProjectLayout) -> Self {
        Self {
            ledger,
            pipeline,
            emitter: ManifestEmitter::default(),
            layout,
            max_scenes_per_run: 0,
            cleanup_staging: true,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_emitter(mut self, emitter: ManifestEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    /// Limit the scenes converted per job. `0` means unlimited.
    pub fn with_max_scenes_per_run(mut self, max: usize) -> Self {
        self.max_scenes_per_run = max;
        self
    }

    /// Whether the staging directory is removed when a job ends.
    pub fn with_cleanup_staging(mut self, cleanup: bool) -> Self {
        self.cleanup_staging = cleanup;
        self
    }

    /// Share a stop flag; once set, no further download or scene is started.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn ledger(&self) -> &Arc<JobLedger> {
        &self.ledger
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Converts local files into `project`.
    ///
    /// The files are copied into staging first, so the job never reads
    /// from the caller's paths after the saving stage.
    pub async fn run_upload(
        &self,
        project: &str,
        files: &[PathBuf],
    ) -> Result<JobSummary, JobError> {
        let project = checked_project(project)?;
        if files.is_empty() {
            return Err(JobError::NoInputs);
        }

        let tracker = JobTracker::register(
            Arc::clone(&self.ledger),
            JobKind::DirectUpload,
            &project,
            files.len(),
        );
        info!(job_id = %tracker.id(), project = %project, files = files.len(), "Upload job started");
        tracker.advance(JobStatus::SavingUploads);

        match self.stage_uploads(&tracker, &project, files).await {
            Ok(intake) => self.process(tracker, project, JobKind::DirectUpload, files.len(), intake).await,
            Err(e) => Err(self.abort(&tracker, &project, e).await),
        }
    }

    /// Downloads remote files into `project`, then converts them.
    ///
    /// Files are fetched one at a time. A file that cannot be fetched is
    /// reported and skipped; the job fails only if no scene is produced.
    pub async fn run_fetch<P, F>(
        &self,
        fetcher: &ResilientFetcher<P, F>,
        project: &str,
        files: &[RemoteFile],
    ) -> Result<JobSummary, JobError>
    where
        P: Downloader,
        F: Downloader,
    {
        let project = checked_project(project)?;
        if files.is_empty() {
            return Err(JobError::NoInputs);
        }

        let tracker = JobTracker::register(
            Arc::clone(&self.ledger),
            JobKind::GdriveFetch,
            &project,
            files.len(),
        );
        info!(job_id = %tracker.id(), project = %project, files = files.len(), "Fetch job started");
        tracker.advance(JobStatus::Downloading);

        match self.download_all(&tracker, fetcher, &project, files).await {
            Ok(intake) => self.process(tracker, project, JobKind::GdriveFetch, files.len(), intake).await,
            Err(e) => Err(self.abort(&tracker, &project, e).await),
        }
    }

    async fn stage_uploads(
        &self,
        tracker: &JobTracker,
        project: &str,
        files: &[PathBuf],
    ) -> Result<Intake, JobError> {
        let staging = self.create_staging(project).await?;
        let mut intake = Intake::default();
        let mut staged = HashSet::new();

        for source in files {
            let label = source.display().to_string();
            let Some(name) = source
                .file_name()
                .and_then(|n| sanitize_file_name(&n.to_string_lossy()))
            else {
                warn!(path = %label, "Skipping upload without a usable file name");
                intake.reject(tracker, label);
                continue;
            };
            if !staged.insert(name.clone()) {
                warn!(path = %label, file = %name, "Skipping upload with a duplicate file name");
                intake.reject(tracker, label);
                continue;
            }

            let dest = staging.join(&name);
            tracker.update(|r| r.current_file = Some(name.clone()));
            if let Err(e) = tokio::fs::copy(source, &dest).await {
                error!(path = %label, error = %e, "Failed to stage upload");
                remove_partial(&dest).await;
                intake.reject(tracker, label);
                continue;
            }
            tracker.update(|r| r.staged_files += 1);
            debug!(from = %label, to = %dest.display(), "Upload staged");
            intake.inputs.push(dest);
        }
        Ok(intake)
    }

    async fn download_all<P, F>(
        &self,
        tracker: &JobTracker,
        fetcher: &ResilientFetcher<P, F>,
        project: &str,
        files: &[RemoteFile],
    ) -> Result<Intake, JobError>
    where
        P: Downloader,
        F: Downloader,
    {
        let staging = self.create_staging(project).await?;
        let mut intake = Intake::default();
        let mut staged = HashSet::new();

        for (index, file) in files.iter().enumerate() {
            if self.stop.load(Ordering::SeqCst) {
                info!(
                    remaining = files.len() - index,
                    "Stop requested, not starting remaining downloads"
                );
                intake
                    .deferred
                    .extend(files[index..].iter().map(|f| f.name.clone()));
                break;
            }

            let Some(name) = sanitize_file_name(&file.name) else {
                warn!(file = %file, "Skipping remote file without a usable name");
                intake.reject(tracker, file.name.clone());
                continue;
            };
            if !staged.insert(name.clone()) {
                warn!(file = %file, "Skipping remote file with a duplicate name");
                intake.reject(tracker, file.name.clone());
                continue;
            }

            let dest = staging.join(&name);
            tracker.update(|r| r.current_file = Some(file.name.clone()));
            match fetcher.fetch(file, &dest).await {
                Ok(outcome) => {
                    debug!(
                        file = %file.name,
                        bytes = outcome.bytes,
                        attempts = outcome.attempts,
                        fallback = outcome.used_fallback,
                        "Remote file staged"
                    );
                    tracker.update(|r| r.staged_files += 1);
                    intake.inputs.push(dest);
                }
                Err(e) => {
                    error!(file = %file, error = %e, "Download failed");
                    intake.reject(tracker, file.name.clone());
                }
            }
        }
        Ok(intake)
    }

    async fn process(
        &self,
        tracker: JobTracker,
        project: String,
        kind: JobKind,
        total: usize,
        intake: Intake,
    ) -> Result<JobSummary, JobError> {
        tracker.advance(JobStatus::Processing);
        tracker.update(|r| r.current_file = None);

        let coordinator = BatchCoordinator::new(
            Arc::clone(&self.pipeline),
            self.layout.scenes_dir(&project),
        )
        .with_max_scenes_per_run(self.max_scenes_per_run)
        .with_stop_flag(Arc::clone(&self.stop));
        let progress = progress_callback(tracker.clone(), intake.failed_files.len());
        let inputs = intake.inputs.clone();

        let report = match tokio::task::spawn_blocking(move || {
            coordinator.run_with_progress(&inputs, Some(&progress))
        })
        .await
        {
            Ok(report) => report,
            Err(e) => {
                let err = JobError::Worker(e.to_string());
                return Err(self.abort(&tracker, &project, err).await);
            }
        };

        if !report.is_success() {
            let mut failed = intake.failed_files.clone();
            failed.extend(report.failed_names());
            let err = JobError::NothingProcessed {
                job_id: tracker.id().clone(),
                failed,
            };
            return Err(self.abort(&tracker, &project, err).await);
        }

        tracker.advance(JobStatus::Finalizing);
        let project_dir = self.layout.project_dir(&project);
        let manifest =
            match self
                .emitter
                .emit(&project_dir, &project, &project, &report.processed)
            {
                Ok(paths) => paths,
                Err(e) => return Err(self.abort(&tracker, &project, e.into()).await),
            };

        tracker.advance(JobStatus::Completed);
        tracker.finish();
        self.cleanup(&project).await;

        let mut deferred = intake.deferred;
        deferred.extend(report.deferred.iter().map(|p| file_label(p)));

        info!(
            job_id = %tracker.id(),
            project = %project,
            processed = report.processed.len(),
            failed = report.failed.len() + intake.failed_files.len(),
            deferred = deferred.len(),
            "Job completed"
        );

        Ok(JobSummary {
            job_id: tracker.id().clone(),
            kind,
            project,
            project_dir,
            total,
            processed: report.processed,
            failed_scenes: report.failed,
            failed_files: intake.failed_files,
            deferred,
            manifest,
        })
    }

    /// Records a fatal error, removes the ledger entry and staging.
    async fn abort(&self, tracker: &JobTracker, project: &str, error: JobError) -> JobError {
        error!(job_id = %tracker.id(), project = %project, error = %error, "Job failed");
        tracker.fail(&error.to_string());
        tracker.finish();
        self.cleanup(project).await;
        error
    }

    async fn create_staging(&self, project: &str) -> Result<PathBuf, JobError> {
        let staging = self.layout.staging_dir(project);
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|e| JobError::io(&staging, e))?;
        Ok(staging)
    }

    async fn cleanup(&self, project: &str) {
        if !self.cleanup_staging {
            return;
        }
        let staging = self.layout.staging_dir(project);
        match tokio::fs::remove_dir_all(&staging).await {
            Ok(()) => debug!(path = %staging.display(), "Staging removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %staging.display(), error = %e, "Failed to remove staging"),
        }
    }
}

impl Intake {
    fn reject(&mut self, tracker: &JobTracker, label: String) {
        self.failed_files.push(label);
        tracker.update(|r| r.failed_files += 1);
    }
}

/// Removes whatever a failed copy left at `path`.
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial upload"),
    }
}

fn checked_project(project: &str) -> Result<String, JobError> {
    sanitize_project_name(project).ok_or_else(|| JobError::InvalidProject(project.to_string()))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Mirrors batch progress into the ledger entry.
fn progress_callback(tracker: JobTracker, intake_failures: usize) -> BatchProgressCallback {
    Arc::new(move |progress: BatchProgress| {
        tracker.update(move |r| {
            r.processed_files = progress.scenes_complete;
            r.failed_files = intake_failures + progress.scenes_failed;
            r.current_file = progress.current_scene;
        });
    })
}
