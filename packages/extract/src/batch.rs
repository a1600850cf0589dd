//! Batch orchestration.
//!
//! Discovers archives in the input directory, walks them concurrently with
//! a bounded [`buffer_unordered`](futures::StreamExt::buffer_unordered)
//! stream, folds the per-archive reports into a [`BatchSummary`], and
//! writes the table once every walk has finished.
//!
//! Archives are merged in completion order, so the relative order of two
//! archives' rows in the output is not fixed. Rows from one archive stay
//! together in walk order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt as _};
use zipwise_extract_models::{ArchiveFailure, BatchOutcome, BatchSummary};
use zipwise_pdf::{PdfTextReader, TextSource};

use crate::ExtractError;
use crate::archive::{WalkContext, walk_archive};
use crate::config::ExtractConfig;
use crate::progress::ProgressCallback;
use crate::table::write_records;

/// Extracts every archive in `input_dir` and writes the table to `output`
/// using the PDF reader.
///
/// # Errors
///
/// See [`run_with_reader`].
pub async fn run(
    input_dir: &Path,
    output: &Path,
    config: &ExtractConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<BatchOutcome, ExtractError> {
    run_with_reader(input_dir, output, config, Arc::new(PdfTextReader), progress).await
}

/// Extracts every archive in `input_dir` through `reader` and writes the
/// table to `output`.
///
/// An input directory with no archives, or archives that yield no
/// records, produces [`BatchOutcome::NoData`] and no file. Archives that
/// fail to unpack are skipped and listed in
/// [`BatchSummary::archive_failures`].
///
/// # Errors
///
/// Returns [`ExtractError::InvalidInput`] if `input_dir` is not a
/// directory, [`ExtractError::Regex`]/[`ExtractError::Config`] for bad
/// patterns, and [`ExtractError::Output`]/[`ExtractError::Csv`] if the
/// table cannot be written.
pub async fn run_with_reader(
    input_dir: &Path,
    output: &Path,
    config: &ExtractConfig,
    reader: Arc<dyn TextSource>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<BatchOutcome, ExtractError> {
    let start = Instant::now();
    let mut summary = BatchSummary::default();

    let archives = discover_archives(input_dir, &config.layout.archive_extension)?;
    summary.archives_found = archives.len() as u64;

    if archives.is_empty() {
        log::warn!("No archives found in {}", input_dir.display());
        progress.finish("No archives found".to_string());
        summary.elapsed = start.elapsed();
        return Ok(BatchOutcome::NoData(summary));
    }

    let ctx = Arc::new(WalkContext::new(config, reader)?);
    let workers = archives.len().min(config.worker_limit());

    log::info!(
        "Processing {} archive(s) from {} (workers={workers})",
        archives.len(),
        input_dir.display()
    );

    progress.set_total(summary.archives_found);
    progress.set_message("Extracting permits".to_string());

    let results: Vec<_> = stream::iter(archives.into_iter().map(|archive| {
        let ctx = Arc::clone(&ctx);
        let progress = Arc::clone(progress);
        async move {
            let result = walk_archive(&archive, &ctx).await;
            progress.inc(1);
            (archive, result)
        }
    }))
    .buffer_unordered(workers)
    .collect()
    .await;

    let mut records = Vec::new();
    for (archive, result) in results {
        match result {
            Ok(report) => {
                log::info!(
                    "{}: {} record(s)",
                    archive.display(),
                    report.records.len()
                );
                records.extend(summary.absorb(report));
            }
            Err(e) => {
                log::error!("Skipping archive {}: {e}", archive.display());
                summary.archive_failures.push(ArchiveFailure {
                    archive,
                    reason: e.to_string(),
                });
            }
        }
    }

    if records.is_empty() {
        log::warn!("No data extracted!");
        progress.finish("No data extracted".to_string());
        summary.elapsed = start.elapsed();
        return Ok(BatchOutcome::NoData(summary));
    }

    write_records(&records, output)?;
    summary.output = Some(output.to_path_buf());
    summary.elapsed = start.elapsed();

    log::info!(
        "Processed {} records in {} ({:.1}s)",
        summary.total_records,
        output.display(),
        summary.elapsed.as_secs_f64()
    );
    log::info!("Type A folders (Permit only): {}", summary.without_companion);
    log::info!("Type B folders (Permit + eVisa): {}", summary.with_companion);
    if !summary.archive_failures.is_empty() {
        log::warn!("{} archive(s) skipped", summary.archive_failures.len());
    }
    if !summary.unreadable_documents.is_empty() {
        log::warn!(
            "{} document(s) unreadable",
            summary.unreadable_documents.len()
        );
    }
    if !summary.rejected_documents.is_empty() {
        log::warn!("{} document(s) rejected", summary.rejected_documents.len());
    }

    progress.finish(format!("Extracted {} records", summary.total_records));

    Ok(BatchOutcome::Written(summary))
}

/// Lists files directly inside `input_dir` whose extension matches
/// `extension` (case-insensitive), sorted by path.
///
/// # Errors
///
/// Returns [`ExtractError::InvalidInput`] if `input_dir` does not exist or
/// is not a directory, and [`ExtractError::Io`] if it cannot be read.
pub fn discover_archives(input_dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ExtractError> {
    if !input_dir.is_dir() {
        return Err(ExtractError::InvalidInput(format!(
            "{} is not a directory",
            input_dir.display()
        )));
    }

    let extension = extension.trim_start_matches('.');
    let io_err = |source| ExtractError::Io {
        path: input_dir.display().to_string(),
        source,
    };

    let mut archives = Vec::new();
    for entry in std::fs::read_dir(input_dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        {
            archives.push(path);
        }
    }
    archives.sort();

    Ok(archives)
}
