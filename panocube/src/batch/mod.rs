//! Batch coordinator: runs the cube pipeline over an ordered list of inputs.
//!
//! Each input becomes one scene. A scene either ends up complete on disk and
//! in [`BatchReport::processed`], or absent from disk and named in
//! [`BatchReport::failed`]. Failures never stop the batch.

mod discover;
mod progress;

pub use discover::{discover_inputs, is_supported_image, DiscoverError, SUPPORTED_EXTENSIONS};
pub use progress::{BatchPhase, BatchProgress, BatchProgressCallback};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::pipeline::CubePipeline;

/// A scene that was fully produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedScene {
    pub name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

/// A scene that was discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedScene {
    pub name: String,
    pub input_path: PathBuf,
    pub reason: String,
}

/// Outcome of one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneOutcome {
    Processed(ProcessedScene),
    Failed(FailedScene),
}

/// Result of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Successful scenes, in submission order.
    pub processed: Vec<ProcessedScene>,
    /// Failed scenes, in submission order.
    pub failed: Vec<FailedScene>,
    /// Inputs not started, because of the per-run limit or a stop request.
    pub deferred: Vec<PathBuf>,
    /// Number of inputs submitted.
    pub total: usize,
}

impl BatchReport {
    /// A batch succeeds when at least one scene was produced.
    pub fn is_success(&self) -> bool {
        !self.processed.is_empty()
    }

    pub fn failed_names(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.name.clone()).collect()
    }

    fn record(&mut self, outcome: SceneOutcome) {
        match outcome {
            SceneOutcome::Processed(scene) => self.processed.push(scene),
            SceneOutcome::Failed(scene) => self.failed.push(scene),
        }
    }
}

/// Scene name for an input: its file name without extension.
pub fn scene_name(input: &Path) -> Option<String> {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().trim().to_string())
        .filter(|name| !name.is_empty() && !name.starts_with('.'))
}

/// Drives the cube pipeline over a batch of inputs.
pub struct BatchCoordinator {
    pipeline: Arc<CubePipeline>,
    scenes_root: PathBuf,
    max_scenes_per_run: usize,
    stop: Arc<AtomicBool>,
}

impl BatchCoordinator {
    /// Creates a coordinator writing scene directories under `scenes_root`.
    pub fn new(pipeline: Arc<CubePipeline>, scenes_root: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            scenes_root: scenes_root.into(),
            max_scenes_per_run: 0,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Limit the number of inputs started per run. `0` means unlimited.
    pub fn with_max_scenes_per_run(mut self, max: usize) -> Self {
        self.max_scenes_per_run = max;
        self
    }

    /// Share a stop flag; once set, no further input is started.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn scenes_root(&self) -> &Path {
        &self.scenes_root
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Runs the batch without progress reporting.
    pub fn run(&self, inputs: &[PathBuf]) -> BatchReport {
        self.run_with_progress(inputs, None)
    }

    /// Runs the batch, reporting progress before each scene and at the end.
    pub fn run_with_progress(
        &self,
        inputs: &[PathBuf],
        progress: Option<&BatchProgressCallback>,
    ) -> BatchReport {
        let admitted = match self.max_scenes_per_run {
            0 => inputs.len(),
            max => inputs.len().min(max),
        };
        if admitted < inputs.len() {
            warn!(
                admitted,
                total = inputs.len(),
                "Scene limit reached, deferring remaining inputs"
            );
        }

        let mut report = BatchReport {
            total: inputs.len(),
            ..Default::default()
        };
        let mut seen = HashSet::new();

        for (index, input) in inputs[..admitted].iter().enumerate() {
            if self.stop.load(Ordering::SeqCst) {
                info!(
                    remaining = admitted - index,
                    "Stop requested, not starting remaining scenes"
                );
                report.deferred.extend(inputs[index..admitted].iter().cloned());
                break;
            }

            let name = scene_name(input).unwrap_or_default();
            if let Some(cb) = progress {
                cb(BatchProgress::at_scene_start(
                    &name,
                    report.processed.len(),
                    report.failed.len(),
                    admitted,
                ));
            }

            let outcome = if name.is_empty() {
                failed(name, input, "cannot derive a scene name from the file name")
            } else if !seen.insert(name.clone()) {
                failed(name, input, "duplicate scene name in this batch")
            } else {
                self.process_one(&name, input)
            };

            if let SceneOutcome::Failed(scene) = &outcome {
                error!(
                    scene = %scene.name,
                    input = %scene.input_path.display(),
                    reason = %scene.reason,
                    "Scene failed"
                );
            }
            report.record(outcome);
        }

        report.deferred.extend(inputs[admitted..].iter().cloned());

        if let Some(cb) = progress {
            cb(BatchProgress::at_complete(
                report.processed.len(),
                report.failed.len(),
                admitted,
            ));
        }

        info!(
            processed = report.processed.len(),
            failed = report.failed.len(),
            deferred = report.deferred.len(),
            total = report.total,
            "Batch complete"
        );
        report
    }

    /// Converts a single input into the scene `name`.
    ///
    /// A failed conversion removes whatever was written for the scene.
    pub fn process_one(&self, name: &str, input: &Path) -> SceneOutcome {
        let output_path = self.scenes_root.join(name);
        info!(scene = %name, input = %input.display(), "Converting scene");

        match self.pipeline.convert(input, &output_path) {
            Ok(_) => SceneOutcome::Processed(ProcessedScene {
                name: name.to_string(),
                input_path: input.to_path_buf(),
                output_path,
            }),
            Err(e) => {
                if output_path.exists() {
                    if let Err(cleanup) = std::fs::remove_dir_all(&output_path) {
                        warn!(
                            path = %output_path.display(),
                            error = %cleanup,
                            "Failed to remove partial scene"
                        );
                    }
                }
                failed(name.to_string(), input, &e.to_string())
            }
        }
    }
}

fn failed(name: String, input: &Path, reason: &str) -> SceneOutcome {
    SceneOutcome::Failed(FailedScene {
        name,
        input_path: input.to_path_buf(),
        reason: reason.to_string(),
    })
}
