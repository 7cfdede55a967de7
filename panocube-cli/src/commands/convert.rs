//! Convert command - turn local panoramas into a cube map project.

use std::path::{Path, PathBuf};

use tracing::info;

use panocube::batch::discover_inputs;

use super::common::{pipeline_config, print_summary, StrategyArg};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Project name used when none can be derived from the input.
const DEFAULT_PROJECT: &str = "default_project";

/// Arguments for the convert command.
pub struct ConvertArgs {
    pub input: PathBuf,
    pub project: Option<String>,
    pub size: Option<u32>,
    pub strategy: Option<StrategyArg>,
    pub workers: Option<usize>,
    pub max_scenes: Option<usize>,
}

/// Run the convert command.
pub fn run(args: ConvertArgs, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("convert");

    let inputs = discover_inputs(&args.input)?;
    let project = args
        .project
        .clone()
        .unwrap_or_else(|| project_from_input(&args.input));

    let pipeline = pipeline_config(runner.config(), args.size, args.strategy, args.workers);
    info!(
        input = %args.input.display(),
        project = %project,
        files = inputs.len(),
        cube_size = pipeline.cube_size,
        strategy = %pipeline.strategy,
        "Converting panoramas"
    );
    println!(
        "Converting {} panorama(s) into project '{}' ({}px faces, {})...",
        inputs.len(),
        project,
        pipeline.cube_size,
        pipeline.strategy
    );

    let ledger = runner.open_ledger()?;
    let stop = runner.install_stop_handler(ledger.clone())?;
    let mut job_runner = runner.job_runner(ledger, pipeline, stop)?;
    if let Some(max) = args.max_scenes {
        job_runner = job_runner.with_max_scenes_per_run(max);
    }

    let summary = runner.block_on(job_runner.run_upload(&project, &inputs))??;
    print_summary(&summary);
    Ok(())
}

/// Derive a project name from the input directory or file name.
fn project_from_input(input: &Path) -> String {
    let name = if input.is_dir() {
        input.file_name()
    } else {
        input.file_stem()
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROJECT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_from_file_uses_stem() {
        assert_eq!(project_from_input(Path::new("/tmp/lobby.jpg")), "lobby");
    }

    #[test]
    fn test_project_from_directory_uses_name() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("villa");
        std::fs::create_dir(&dir).unwrap();
        assert_eq!(project_from_input(&dir), "villa");
    }

    #[test]
    fn test_project_fallback() {
        assert_eq!(project_from_input(Path::new("/")), DEFAULT_PROJECT);
    }
}
