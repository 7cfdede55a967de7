//! Jobs command - inspect jobs left in the ledger by an interrupted run.

use panocube::config::ConfigFile;
use panocube::ledger::JobLedger;

use crate::error::CliError;

/// Run the jobs command.
///
/// Opens the ledger without installing logging or a signal handler; the
/// command only reads and optionally rewrites the ledger file.
pub fn run(discard: bool) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let ledger = JobLedger::open(&config.ledger.file)?;
    let leftovers = ledger.leftovers();

    if leftovers.is_empty() {
        println!("No leftover jobs in {}", ledger.location());
        return Ok(());
    }

    println!("Leftover jobs in {}", ledger.location());
    println!();
    for note in &leftovers {
        let record = &note.record;
        println!("{}", note.id);
        println!("  Type:      {}", record.kind);
        println!("  Project:   {}", record.project_name);
        println!("  Status:    {}", record.status);
        println!(
            "  Progress:  {} processed, {} failed, {} total",
            record.processed_files, record.failed_files, record.total_files
        );
        println!(
            "  Updated:   {}",
            record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        if let Some(error) = &record.error {
            println!("  Error:     {}", error);
        }
        println!("  Recovery:  {}", note.disposition);
        println!();
    }

    if discard {
        let removed = ledger.discard_leftovers()?;
        println!("Discarded {} leftover job(s).", removed);
    } else {
        println!("Run 'panocube jobs --discard' to remove them.");
    }

    Ok(())
}
