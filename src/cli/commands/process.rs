//! Process command implementation.

use std::path::Path;

use anyhow::Result;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, RunOptions};

/// Run the process command.
pub async fn run_process(
    zip_path: &str,
    transcripts: bool,
    dry_run: bool,
    hybrid: bool,
    settings: Settings,
) -> Result<()> {
    // The archive must exist before anything else happens.
    if !Path::new(zip_path).exists() {
        Output::error(&format!("ZIP file not found: {zip_path}"));
        return Err(anyhow::anyhow!("ZIP file not found: {zip_path}"));
    }

    // Dry runs make no network calls and need no credentials.
    if !dry_run {
        if let Err(e) = preflight::check(Operation::Process { hybrid }) {
            Output::error(&format!("{}", e));
            Output::info("Run 'ferd doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    Output::info(&format!("Processing export: {zip_path}"));
    if dry_run {
        Output::warning("Dry run mode: no model API calls will be made");
    }
    if hybrid {
        Output::info("Hybrid mode: transcripts come from the diarizing transcription model");
    }

    let orchestrator = Orchestrator::new(settings)?;
    let options = RunOptions {
        verbose: transcripts,
        dry_run,
        hybrid,
    };

    match orchestrator.process_export(Path::new(zip_path), options).await {
        Ok(_) => Ok(()),
        Err(e) => {
            Output::error(&format!("Processing failed: {}", e));
            Err(e.into())
        }
    }
}
