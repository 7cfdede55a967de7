//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use panocube::batch::DiscoverError;
use panocube::config::ConfigFileError;
use panocube::fetch::FetchError;
use panocube::ledger::LedgerError;
use panocube::pipeline::PipelineError;
use panocube::service::JobError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to open or write the job ledger
    Ledger(LedgerError),
    /// Failed to set up the conversion pipeline
    Pipeline(PipelineError),
    /// Input path could not be used
    Input(DiscoverError),
    /// Failed to set up the remote fetcher
    Fetch(FetchError),
    /// The job ended in error
    Job(JobError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Ledger(_) => {
                eprintln!();
                eprintln!("The job ledger location is set by ledger.file:");
                eprintln!("  panocube config get ledger.file");
            }
            CliError::Input(DiscoverError::Unsupported(_)) => {
                eprintln!();
                eprintln!("Supported inputs: .jpg, .jpeg and .png panoramas, or a directory of them.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Ledger(e) => write!(f, "Job ledger error: {}", e),
            CliError::Pipeline(e) => write!(f, "Failed to create pipeline: {}", e),
            CliError::Input(e) => write!(f, "Invalid input: {}", e),
            CliError::Fetch(e) => write!(f, "Failed to create fetcher: {}", e),
            CliError::Job(e) => write!(f, "Job failed: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Ledger(e) => Some(e),
            CliError::Pipeline(e) => Some(e),
            CliError::Input(e) => Some(e),
            CliError::Fetch(e) => Some(e),
            CliError::Job(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LedgerError> for CliError {
    fn from(e: LedgerError) -> Self {
        CliError::Ledger(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

impl From<DiscoverError> for CliError {
    fn from(e: DiscoverError) -> Self {
        CliError::Input(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Fetch(e)
    }
}

impl From<JobError> for CliError {
    fn from(e: JobError) -> Self {
        CliError::Job(e)
    }
}
