//! Integration tests for the job runner.
//!
//! These tests verify the complete job workflow including:
//! - Upload jobs staging, converting and emitting a manifest
//! - Fetch jobs with mock downloaders, including failed files
//! - Ledger entries removed once a job ends, on success and on failure
//! - Staging cleanup
//! - Leftover jobs from an earlier process surfacing on reopen

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{Rgb, RgbImage};
use panocube::fetch::{Downloader, FetchConfig, FetchError, RemoteFile, ResilientFetcher};
use panocube::ledger::{JobId, JobKind, JobLedger, JobRecord, JobStatus, RecoveryDisposition};
use panocube::pipeline::{CubePipeline, PipelineConfig, RenderStrategy};
use panocube::service::{JobError, JobRunner, ProjectLayout};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

fn panorama_png() -> Vec<u8> {
    let img = RgbImage::from_fn(64, 32, |x, y| Rgb([(x * 4) as u8, (y * 8) as u8, 90]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}

fn write_panorama(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, panorama_png()).unwrap();
    path
}

struct Fixture {
    temp: TempDir,
    ledger_path: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let ledger_path = temp.path().join("state").join("jobs.json");
        Self { temp, ledger_path }
    }

    fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(self.temp.path().join("out"), self.temp.path().join("uploads"))
    }

    fn runner(&self) -> JobRunner {
        let config = PipelineConfig::default()
            .with_cube_size(16)
            .with_strategy(RenderStrategy::Sequential)
            .with_preview_size(8, 48)
            .with_thumb_size(8);
        let pipeline = Arc::new(CubePipeline::new(config).unwrap());
        let ledger = Arc::new(JobLedger::open(&self.ledger_path).unwrap());
        JobRunner::new(ledger, pipeline, self.layout())
    }

    fn inputs_dir(&self) -> PathBuf {
        let dir = self.temp.path().join("inputs");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}

/// Serves a fixed body, or fails for the listed file ids.
struct ScriptedDownloader {
    body: Vec<u8>,
    failing_ids: Vec<&'static str>,
    calls: AtomicU32,
}

impl ScriptedDownloader {
    fn new(body: Vec<u8>, failing_ids: Vec<&'static str>) -> Self {
        Self {
            body,
            failing_ids,
            calls: AtomicU32::new(0),
        }
    }
}

impl Downloader for ScriptedDownloader {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn download(&self, file: &RemoteFile, dest: &Path) -> Result<u64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_ids.contains(&file.id.as_str()) {
            return Err(FetchError::Interstitial {
                url: format!("mock://{}", file.id),
            });
        }
        tokio::fs::write(dest, &self.body)
            .await
            .map_err(|e| FetchError::io(dest, e))?;
        Ok(self.body.len() as u64)
    }
}

fn fast_fetch_config() -> FetchConfig {
    FetchConfig::default()
        .with_backoff_step(Duration::from_millis(1))
        .with_large_file_threshold(None)
}

// =============================================================================
// Upload jobs
// =============================================================================

#[tokio::test]
async fn test_upload_job_completes_and_leaves_no_ledger_entry() {
    let fixture = Fixture::new();
    let inputs = fixture.inputs_dir();
    let files = vec![
        write_panorama(&inputs, "hall.png"),
        write_panorama(&inputs, "living room.png"),
    ];
    let runner = fixture.runner();

    let summary = runner.run_upload("villa", &files).await.unwrap();

    assert_eq!(summary.kind, JobKind::DirectUpload);
    assert_eq!(summary.total, 2);
    let names: Vec<_> = summary.processed.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["hall", "living_room"]);
    assert!(!summary.is_partial());

    let layout = fixture.layout();
    assert!(layout.scenes_dir("villa").join("hall").join("pano_f.jpg").is_file());
    assert!(summary.manifest.xml.is_file());
    assert!(summary.manifest.html.is_file());
    assert!(!layout.staging_dir("villa").exists());

    assert!(runner.ledger().is_empty());
    let persisted = std::fs::read_to_string(&fixture.ledger_path).unwrap();
    assert_eq!(persisted.trim(), "{}");
}

#[tokio::test]
async fn test_upload_job_with_partial_failure_reports_failed_scene() {
    let fixture = Fixture::new();
    let inputs = fixture.inputs_dir();
    let good = write_panorama(&inputs, "hall.png");
    let bad = inputs.join("attic.jpg");
    std::fs::write(&bad, b"garbage").unwrap();
    let runner = fixture.runner();

    let summary = runner.run_upload("villa", &[bad, good]).await.unwrap();

    assert_eq!(summary.processed.len(), 1);
    assert_eq!(summary.failed_scene_names(), ["attic"]);
    assert!(summary.is_partial());

    let xml = std::fs::read_to_string(&summary.manifest.xml).unwrap();
    assert!(xml.contains("funny_hall"));
    assert!(!xml.contains("attic"));
    assert!(!fixture.layout().scenes_dir("villa").join("attic").exists());
}

#[tokio::test]
async fn test_upload_job_with_no_successes_is_an_error() {
    let fixture = Fixture::new();
    let inputs = fixture.inputs_dir();
    let bad = inputs.join("attic.jpg");
    std::fs::write(&bad, b"garbage").unwrap();
    let runner = fixture.runner();

    let err = runner.run_upload("villa", &[bad]).await.unwrap_err();

    match err {
        JobError::NothingProcessed { failed, .. } => assert_eq!(failed, ["attic"]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(runner.ledger().is_empty());
    assert!(!fixture.layout().project_dir("villa").join("user1.xml").exists());
    assert!(!fixture.layout().staging_dir("villa").exists());
}

#[tokio::test]
async fn test_staging_kept_when_cleanup_disabled() {
    let fixture = Fixture::new();
    let inputs = fixture.inputs_dir();
    let files = vec![write_panorama(&inputs, "hall.png")];
    let runner = fixture.runner().with_cleanup_staging(false);

    runner.run_upload("villa", &files).await.unwrap();

    assert!(fixture.layout().staging_dir("villa").join("hall.png").is_file());
}

#[tokio::test]
async fn test_stop_flag_defers_every_scene() {
    let fixture = Fixture::new();
    let inputs = fixture.inputs_dir();
    let files = vec![write_panorama(&inputs, "hall.png")];
    let stop = Arc::new(AtomicBool::new(true));
    let runner = fixture.runner().with_stop_flag(stop);

    let err = runner.run_upload("villa", &files).await.unwrap_err();

    assert!(matches!(err, JobError::NothingProcessed { .. }));
    assert!(runner.ledger().is_empty());
}

// =============================================================================
// Fetch jobs
// =============================================================================

#[tokio::test]
async fn test_fetch_job_skips_failed_download() {
    let fixture = Fixture::new();
    let runner = fixture.runner();
    let fetcher = ResilientFetcher::new(
        ScriptedDownloader::new(panorama_png(), vec!["broken"]),
        ScriptedDownloader::new(panorama_png(), vec!["broken"]),
        fast_fetch_config(),
    );
    let files = vec![
        RemoteFile::new("ok-1", "hall.png"),
        RemoteFile::new("broken", "attic.png"),
        RemoteFile::new("ok-2", "garden.png"),
    ];

    let summary = runner.run_fetch(&fetcher, "villa", &files).await.unwrap();

    assert_eq!(summary.kind, JobKind::GdriveFetch);
    let names: Vec<_> = summary.processed.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["hall", "garden"]);
    assert_eq!(summary.failed_files, ["attic.png"]);
    assert!(runner.ledger().is_empty());
}

#[tokio::test]
async fn test_fetch_job_with_every_download_failing_is_an_error() {
    let fixture = Fixture::new();
    let runner = fixture.runner();
    let fetcher = ResilientFetcher::new(
        ScriptedDownloader::new(Vec::new(), vec!["a"]),
        ScriptedDownloader::new(Vec::new(), vec!["a"]),
        fast_fetch_config(),
    );

    let err = runner
        .run_fetch(&fetcher, "villa", &[RemoteFile::new("a", "hall.png")])
        .await
        .unwrap_err();

    match err {
        JobError::NothingProcessed { failed, .. } => assert_eq!(failed, ["hall.png"]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(runner.ledger().is_empty());
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn test_leftover_jobs_surface_on_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("jobs.json");

    {
        let ledger = JobLedger::open(&path).unwrap();
        let upload = JobId::from("upload-crashed");
        ledger
            .register(upload.clone(), JobRecord::new(JobKind::DirectUpload, "villa", 3))
            .unwrap();
        ledger.advance(&upload, JobStatus::Processing).unwrap();

        let fetch = JobId::from("fetch-crashed");
        ledger
            .register(fetch.clone(), JobRecord::new(JobKind::GdriveFetch, "loft", 1))
            .unwrap();
    }

    let reopened = JobLedger::open(&path).unwrap();
    let notes = reopened.leftovers();
    assert_eq!(notes.len(), 2);

    let upload = notes.iter().find(|n| n.id.as_str() == "upload-crashed").unwrap();
    assert_eq!(upload.record.status, JobStatus::Processing);
    assert_eq!(upload.disposition, RecoveryDisposition::NotResumable);

    let fetch = notes.iter().find(|n| n.id.as_str() == "fetch-crashed").unwrap();
    assert_eq!(fetch.disposition, RecoveryDisposition::ResumeNotImplemented);

    assert_eq!(reopened.discard_leftovers().unwrap(), 2);
    assert!(JobLedger::open(&path).unwrap().leftovers().is_empty());
}
