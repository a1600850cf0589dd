//! Shared extract command used by both the `extract` subcommand and the
//! interactive prompt.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::Args;
use zipwise_cli_utils::{IndicatifProgress, MultiProgress};
use zipwise_extract::models::{BatchOutcome, BatchSummary};
use zipwise_extract::{ExtractConfig, ExtractError};

/// Configuration flags shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// TOML file layered over the built-in defaults
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Maximum number of archives processed at once
    #[arg(long)]
    pub workers: Option<usize>,
    /// Seconds to wait for one PDF before marking it unreadable
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Directory to unpack archives into (defaults to the system temp dir)
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Loads the configuration file (if any) and applies the flags on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or a flag is out of
    /// range.
    pub fn load(&self) -> Result<ExtractConfig, ExtractError> {
        let mut config = ExtractConfig::load(self.config.as_deref())?;

        if let Some(workers) = self.workers {
            config.runtime.workers = Some(workers);
        }
        if let Some(secs) = self.timeout_secs {
            config.runtime.document_timeout_secs = secs;
        }
        if let Some(dir) = &self.scratch_dir {
            config.runtime.scratch_dir = Some(dir.clone());
        }

        config.validate()?;

        Ok(config)
    }
}

/// Runs one batch with a progress bar and prints the outcome.
///
/// # Errors
///
/// Returns the batch error if the run fails. "No data" is not an error.
pub async fn execute(
    input: &Path,
    output: &Path,
    config: &ExtractConfig,
    multi: &MultiProgress,
) -> Result<BatchOutcome, ExtractError> {
    let progress = IndicatifProgress::archives_bar(multi, "Scanning for archives...");

    match zipwise_extract::run(input, output, config, &progress).await {
        Ok(outcome) => {
            println!("{}", describe_outcome(&outcome));
            Ok(outcome)
        }
        Err(e) => {
            progress.finish("Extraction failed".to_string());
            log::error!("Extraction failed: {e}");
            Err(e)
        }
    }
}

/// Renders a human-readable report of a finished batch.
#[must_use]
pub fn describe_outcome(outcome: &BatchOutcome) -> String {
    let mut out = String::new();

    match outcome {
        BatchOutcome::Written(summary) => {
            let target = summary
                .output
                .as_deref()
                .map_or_else(String::new, |p| p.display().to_string());
            let _ = writeln!(
                out,
                "Extraction completed successfully: {} records written to {target}",
                summary.total_records
            );
        }
        BatchOutcome::NoData(summary) if summary.archives_found == 0 => {
            out.push_str("No ZIP files found in the selected folder.\n");
        }
        BatchOutcome::NoData(_) => {
            out.push_str("No data extracted.\n");
        }
    }

    describe_summary(&mut out, outcome.summary());

    out.trim_end().to_string()
}

fn describe_summary(out: &mut String, summary: &BatchSummary) {
    if summary.archives_found == 0 {
        return;
    }

    let _ = writeln!(
        out,
        "  archives: {} found, {} processed, {} skipped",
        summary.archives_found,
        summary.archives_processed,
        summary.archive_failures.len()
    );
    let _ = writeln!(
        out,
        "  Type A folders (Permit only): {}",
        summary.without_companion
    );
    let _ = writeln!(
        out,
        "  Type B folders (Permit + eVisa): {}",
        summary.with_companion
    );

    for failure in &summary.archive_failures {
        let _ = writeln!(
            out,
            "  skipped {}: {}",
            failure.archive.display(),
            failure.reason
        );
    }
    for issue in &summary.unreadable_documents {
        let _ = writeln!(
            out,
            "  unreadable {}: {}",
            issue.path.display(),
            issue.reason
        );
    }
    for issue in &summary.rejected_documents {
        let _ = writeln!(out, "  rejected {}: {}", issue.path.display(), issue.reason);
    }
}
