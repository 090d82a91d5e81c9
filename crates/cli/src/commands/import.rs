//! import command - Upload a local photo library
//!
//! Runs the sync engine over a directory of exported photos. Photos whose
//! destination key already exists are skipped; failures are listed but do
//! not stop the run.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use photosync_core::SyncOutcome;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::library::LocalLibrary;
use crate::output::{Formatter, OutputConfig};

/// Upload new photos from a local library directory
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Library directory (searched recursively)
    pub library: PathBuf,

    /// Process at most this many photos
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ImportOutput {
    library: String,
    bucket: String,
    prefix: String,
    #[serde(flatten)]
    outcome: SyncOutcome,
}

/// Execute the import command
pub async fn execute(args: ImportArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let library = match LocalLibrary::open(&args.library) {
        Ok(library) => library,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::NotFound;
        }
    };

    if library.is_empty() {
        formatter.warning(&format!("No photos found in {}", args.library.display()));
    }

    let engine = match super::build_engine(&formatter).await {
        Ok(engine) => engine,
        Err(code) => return code,
    };

    let spinner = formatter.show_progress().then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .expect("Valid template"),
        );
        pb.set_message(format!("Syncing {} photo(s)...", library.len()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = engine.run(&library, args.limit).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            formatter.error(&format!("Sync aborted: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let failed = outcome.has_errors();

    if formatter.is_json() {
        formatter.json(&ImportOutput {
            library: library.root().display().to_string(),
            bucket: engine.bucket().to_string(),
            prefix: engine.prefix().to_string(),
            outcome,
        });
    } else {
        print_summary(&formatter, &outcome);
    }

    if failed {
        ExitCode::GeneralError
    } else {
        ExitCode::Success
    }
}

fn print_summary(formatter: &Formatter, outcome: &SyncOutcome) {
    let summary = format!(
        "Import complete: {} imported, {} skipped, {} errors",
        outcome.imported,
        outcome.skipped,
        outcome.errors.len()
    );

    if !outcome.has_errors() {
        formatter.success(&summary);
        return;
    }

    let rows: Vec<(String, String)> = outcome
        .errors
        .iter()
        .enumerate()
        .map(|(i, msg)| ((i + 1).to_string(), msg.clone()))
        .collect();
    formatter.table(["#", "Error"], &rows);
    formatter.warning(&summary);
}
