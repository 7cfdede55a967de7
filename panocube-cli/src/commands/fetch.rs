//! Fetch command - download panoramas from the drive service and convert them.

use tracing::info;

use panocube::fetch::{RemoteFile, ResilientFetcher};

use super::common::{pipeline_config, print_summary};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub project: String,
    pub files: Vec<RemoteFile>,
    pub api_key: Option<String>,
    pub size: Option<u32>,
}

/// Run the fetch command.
pub fn run(args: FetchArgs, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("fetch");

    let config = runner.config();
    let fetch_config = config.fetch_config()?;
    let api_key = args.api_key.clone().or_else(|| config.fetch.api_key.clone());

    info!(
        project = %args.project,
        files = args.files.len(),
        max_retries = fetch_config.max_retries,
        probe = api_key.is_some(),
        "Fetching panoramas"
    );
    println!(
        "Fetching {} file(s) into project '{}'...",
        args.files.len(),
        args.project
    );

    let pipeline = pipeline_config(config, args.size, None, None);
    let ledger = runner.open_ledger()?;
    let stop = runner.install_stop_handler(ledger.clone())?;
    let job_runner = runner.job_runner(ledger, pipeline, stop)?;

    let summary = runner.block_on(async {
        let fetcher = ResilientFetcher::drive(fetch_config, api_key)?;
        let summary = job_runner
            .run_fetch(&fetcher, &args.project, &args.files)
            .await?;
        Ok::<_, CliError>(summary)
    })??;

    print_summary(&summary);
    Ok(())
}
