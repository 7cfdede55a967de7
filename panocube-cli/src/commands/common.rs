//! Common types and utilities shared across CLI commands.

use clap::ValueEnum;
use panocube::config::ConfigFile;
use panocube::fetch::RemoteFile;
use panocube::pipeline::{PipelineConfig, RenderStrategy};
use panocube::service::JobSummary;

/// Face rendering strategy selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum StrategyArg {
    /// Render the six faces concurrently (fastest)
    Parallel,
    /// Render one face at a time (lowest memory)
    Sequential,
}

impl From<StrategyArg> for RenderStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Parallel => RenderStrategy::Parallel,
            StrategyArg::Sequential => RenderStrategy::Sequential,
        }
    }
}

/// Parse a remote file argument of the form `ID:NAME`.
pub fn parse_remote_file(value: &str) -> Result<RemoteFile, String> {
    let (id, name) = value
        .split_once(':')
        .ok_or_else(|| format!("expected ID:NAME, got '{}'", value))?;
    let (id, name) = (id.trim(), name.trim());
    if id.is_empty() || name.is_empty() {
        return Err(format!("expected ID:NAME, got '{}'", value));
    }
    Ok(RemoteFile::new(id, name))
}

/// Pipeline config from the config file, with command-line overrides.
pub fn pipeline_config(
    config: &ConfigFile,
    size: Option<u32>,
    strategy: Option<StrategyArg>,
    workers: Option<usize>,
) -> PipelineConfig {
    let mut pipeline = config.pipeline_config();
    if let Some(size) = size {
        pipeline = pipeline.with_cube_size(size);
    }
    if let Some(strategy) = strategy {
        pipeline = pipeline.with_strategy(strategy.into());
    }
    if let Some(workers) = workers {
        pipeline = pipeline.with_workers(workers);
    }
    pipeline
}

/// Print the outcome of a job.
pub fn print_summary(summary: &JobSummary) {
    println!();
    println!("Job {} ({})", summary.job_id, summary.kind);
    println!(
        "  Scenes:   {} of {} converted",
        summary.processed.len(),
        summary.total
    );

    for scene in &summary.failed_scenes {
        println!("  Failed:   {} - {}", scene.name, scene.reason);
    }
    for name in &summary.failed_files {
        println!("  Skipped:  {}", name);
    }
    for name in &summary.deferred {
        println!("  Deferred: {}", name);
    }

    println!("  Project:  {}", summary.project_dir.display());
    println!("  Manifest: {}", summary.manifest.xml.display());
    println!("  Viewer:   {}", summary.manifest.html.display());

    if summary.is_partial() {
        println!();
        println!("Completed with errors: some inputs were not converted.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_file() {
        let file = parse_remote_file("1AbC:lobby.jpg").unwrap();
        assert_eq!(file, RemoteFile::new("1AbC", "lobby.jpg"));
    }

    #[test]
    fn test_parse_remote_file_keeps_colons_in_name() {
        let file = parse_remote_file("id:a:b.jpg").unwrap();
        assert_eq!(file.name, "a:b.jpg");
    }

    #[test]
    fn test_parse_remote_file_rejects_malformed() {
        assert!(parse_remote_file("lobby.jpg").is_err());
        assert!(parse_remote_file(":lobby.jpg").is_err());
        assert!(parse_remote_file("id:").is_err());
    }

    #[test]
    fn test_overrides_win_over_config() {
        let config = ConfigFile::default();
        let pipeline = pipeline_config(&config, Some(512), Some(StrategyArg::Sequential), None);
        assert_eq!(pipeline.cube_size, 512);
        assert_eq!(pipeline.strategy, RenderStrategy::Sequential);

        let untouched = pipeline_config(&config, None, None, None);
        assert_eq!(untouched.cube_size, config.cube.size);
    }
}
