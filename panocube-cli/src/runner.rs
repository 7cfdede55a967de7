//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and job runner
//! construction to reduce duplication across command handlers.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use panocube::config::ConfigFile;
use panocube::ledger::JobLedger;
use panocube::logging::{init_logging, LoggingGuard};
use panocube::manifest::ManifestEmitter;
use panocube::pipeline::{CubePipeline, PipelineConfig};
use panocube::service::{JobRunner, ProjectLayout};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// Logs always go to the configured log file. With `verbose` they are
    /// also echoed to stderr at debug level.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(&config.logging.file, verbose, verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("panocube v{}", panocube::VERSION);
        info!("panocube CLI: {} command", command);
        info!(log = %self.logging_guard.path().display(), "Logging to file");
    }

    /// Open the job ledger and report jobs left by an interrupted run.
    pub fn open_ledger(&self) -> Result<Arc<JobLedger>, CliError> {
        let ledger = JobLedger::open(&self.config.ledger.file)?;

        let leftovers = ledger.leftovers();
        if !leftovers.is_empty() {
            warn!(count = leftovers.len(), "Leftover jobs found in ledger");
            println!(
                "Note: {} leftover job(s) from an earlier run. See 'panocube jobs'.",
                leftovers.len()
            );
        }

        Ok(Arc::new(ledger))
    }

    /// Build a job runner from the config, with `pipeline_config` for the
    /// cube pipeline.
    pub fn job_runner(
        &self,
        ledger: Arc<JobLedger>,
        pipeline_config: PipelineConfig,
        stop: Arc<AtomicBool>,
    ) -> Result<JobRunner, CliError> {
        let pipeline = Arc::new(CubePipeline::new(pipeline_config)?);
        let layout = ProjectLayout::new(
            &self.config.output.directory,
            &self.config.fetch.uploads_directory,
        );

        Ok(JobRunner::new(ledger, pipeline, layout)
            .with_emitter(ManifestEmitter::new(self.config.manifest_settings()))
            .with_max_scenes_per_run(self.config.batch.max_scenes_per_run)
            .with_cleanup_staging(self.config.fetch.cleanup_downloads)
            .with_stop_flag(stop))
    }

    /// Install a Ctrl+C handler that asks the running job to stop.
    ///
    /// The first interrupt lets the scene in flight finish and defers the
    /// rest. A second interrupt exits at once with status 130. Both flush the
    /// ledger so the interrupted job is on disk.
    pub fn install_stop_handler(&self, ledger: Arc<JobLedger>) -> Result<Arc<AtomicBool>, CliError> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = stop.clone();

        ctrlc::set_handler(move || {
            flush_ledger(&ledger);
            if interrupt_action(&stop_clone) == InterruptAction::Exit {
                warn!("Second interrupt, exiting without waiting for the current scene");
                eprintln!("\nInterrupted.");
                std::process::exit(INTERRUPT_EXIT_CODE);
            }
            info!("Interrupt received, stopping after the current scene");
            eprintln!("\nStopping after the current scene... (Ctrl+C again to quit now)");
        })
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

        Ok(stop)
    }

    /// Run `future` to completion on a fresh multi-threaded runtime.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, CliError> {
        let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
        Ok(runtime.block_on(future))
    }
}

/// Exit status after a forced interrupt (128 + SIGINT).
const INTERRUPT_EXIT_CODE: i32 = 130;

/// What an interrupt should do given the stop flag's prior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    /// First interrupt: finish the current scene, then stop.
    Stop,
    /// Interrupt while already stopping: quit immediately.
    Exit,
}

fn interrupt_action(stop: &AtomicBool) -> InterruptAction {
    if stop.swap(true, Ordering::SeqCst) {
        InterruptAction::Exit
    } else {
        InterruptAction::Stop
    }
}

fn flush_ledger(ledger: &JobLedger) {
    if let Err(e) = ledger.flush() {
        warn!(error = %e, "Failed to flush job ledger on interrupt");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_interrupt_stops_second_exits() {
        let stop = AtomicBool::new(false);

        assert_eq!(interrupt_action(&stop), InterruptAction::Stop);
        assert!(stop.load(Ordering::SeqCst));
        assert_eq!(interrupt_action(&stop), InterruptAction::Exit);
        assert_eq!(interrupt_action(&stop), InterruptAction::Exit);
    }

    #[test]
    fn test_flush_on_interrupt_writes_ledger() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("jobs.json");
        let ledger = JobLedger::open(&path).unwrap();

        flush_ledger(&ledger);

        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
    }
}
