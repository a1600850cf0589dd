//! Archive walking.
//!
//! Each archive is unpacked into its own scratch directory laid out as
//! `<date folder>/<record folder>/<documents>`. Every permit document in a
//! record folder becomes one
//! [`Record`](zipwise_extract_models::Record); the presence of the companion
//! document in that folder sets the record's companion flag.
//!
//! The scratch directory is a [`tempfile::TempDir`], so it is removed on
//! every exit path: success, error, panic, or a dropped future.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use zipwise_extract_models::{ArchiveReport, DocumentIssue};
use zipwise_pdf::{TextSource, read_text_with_timeout};

use crate::ExtractError;
use crate::config::{ExtractConfig, LayoutConfig};
use crate::fields::FieldExtractor;

/// Everything an archive walk needs, shared read-only across tasks.
pub struct WalkContext {
    extractor: FieldExtractor,
    reader: Arc<dyn TextSource>,
    layout: LayoutConfig,
    scratch_root: PathBuf,
    document_timeout: Duration,
}

impl WalkContext {
    /// Builds a context from `config`, reading documents through `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured pattern is invalid.
    pub fn new(config: &ExtractConfig, reader: Arc<dyn TextSource>) -> Result<Self, ExtractError> {
        Ok(Self {
            extractor: FieldExtractor::new(&config.patterns)?,
            reader,
            layout: config.layout.clone(),
            scratch_root: config.scratch_root(),
            document_timeout: config.document_timeout(),
        })
    }
}

/// A permit document found in a record folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitDocument {
    /// Path inside the scratch directory.
    pub path: PathBuf,
    /// Whether the companion document sits next to it.
    pub has_companion: bool,
}

/// Unpacks `archive` and extracts one record per permit document.
///
/// Unreadable documents still produce an all-empty record and are listed
/// in [`ArchiveReport::unreadable`]. Documents whose dates are not real
/// calendar dates produce no record and are listed in
/// [`ArchiveReport::rejected`].
///
/// # Errors
///
/// Returns [`ExtractError::Archive`] if the archive is corrupt, or
/// [`ExtractError::Io`] if it cannot be unpacked or enumerated. The
/// scratch directory is removed in either case.
pub async fn walk_archive(
    archive: &Path,
    ctx: &WalkContext,
) -> Result<ArchiveReport, ExtractError> {
    let scratch = create_scratch_dir(archive, &ctx.scratch_root)?;

    log::debug!(
        "Unpacking {} -> {}",
        archive.display(),
        scratch.path().display()
    );

    let root = scratch.path().to_path_buf();
    let archive_path = archive.to_path_buf();
    let layout = ctx.layout.clone();
    let documents = tokio::task::spawn_blocking(move || {
        unpack(&archive_path, &root)?;
        discover_permits(&root, &layout)
    })
    .await??;

    log::debug!(
        "{}: found {} permit document(s)",
        archive.display(),
        documents.len()
    );

    let mut report = ArchiveReport::new(archive);

    for document in documents {
        let file_name = document.path.display().to_string();

        let text = match read_text_with_timeout(
            Arc::clone(&ctx.reader),
            document.path.clone(),
            ctx.document_timeout,
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Unreadable document {file_name}: {e}");
                report.unreadable.push(DocumentIssue {
                    path: document.path.clone(),
                    reason: e.to_string(),
                });
                String::new()
            }
        };

        match ctx
            .extractor
            .extract(&text, &file_name, document.has_companion)
        {
            Ok(record) => {
                log::debug!("Extracted {file_name} (passport '{}')", record.passport_number);
                report.records.push(record);
            }
            Err(e) => {
                log::warn!("Rejected {file_name}: {e}");
                report.rejected.push(DocumentIssue {
                    path: document.path,
                    reason: e.to_string(),
                });
            }
        }
    }

    if let Err(e) = scratch.close() {
        log::warn!("Failed to remove scratch directory for {}: {e}", archive.display());
    }

    Ok(report)
}

/// Creates a fresh scratch directory named after the archive stem with a
/// random suffix, so archives sharing a base name never collide.
fn create_scratch_dir(archive: &Path, scratch_root: &Path) -> Result<TempDir, ExtractError> {
    let stem = archive
        .file_stem()
        .map_or_else(|| "archive".into(), |s| s.to_string_lossy());

    std::fs::create_dir_all(scratch_root).map_err(|e| ExtractError::Io {
        path: scratch_root.display().to_string(),
        source: e,
    })?;

    tempfile::Builder::new()
        .prefix(&format!("zipwise-{stem}-"))
        .tempdir_in(scratch_root)
        .map_err(|e| ExtractError::Io {
            path: scratch_root.display().to_string(),
            source: e,
        })
}

/// Extracts every entry of `archive` into `dest`.
fn unpack(archive: &Path, dest: &Path) -> Result<(), ExtractError> {
    let archive_err = |source| ExtractError::Archive {
        path: archive.display().to_string(),
        source,
    };

    let file = std::fs::File::open(archive).map_err(|e| ExtractError::Io {
        path: archive.display().to_string(),
        source: e,
    })?;

    let mut zip = zip::ZipArchive::new(file).map_err(archive_err)?;
    let entries = zip.len();
    zip.extract(dest).map_err(archive_err)?;

    log::trace!("  extracted {entries} entries from {}", archive.display());

    Ok(())
}

/// Walks `root/<date>/<record>/` and collects permit documents.
///
/// Folders and files are visited in name order so the output of one
/// archive is stable across runs.
///
/// # Errors
///
/// Returns [`ExtractError::Io`] if a directory cannot be read.
pub fn discover_permits(
    root: &Path,
    layout: &LayoutConfig,
) -> Result<Vec<PermitDocument>, ExtractError> {
    let mut documents = Vec::new();

    for date_folder in sorted_entries(root, |p| p.is_dir())? {
        for record_folder in sorted_entries(&date_folder, |p| p.is_dir())? {
            let has_companion = record_folder.join(&layout.companion_file).exists();

            for path in sorted_entries(&record_folder, |p| is_permit(p, layout))? {
                documents.push(PermitDocument {
                    path,
                    has_companion,
                });
            }
        }
    }

    Ok(documents)
}

fn is_permit(path: &Path, layout: &LayoutConfig) -> bool {
    if !path.is_file() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let extension = layout.permit_extension.trim_start_matches('.');

    name.starts_with(&layout.permit_prefix)
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

fn sorted_entries(
    dir: &Path,
    keep: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, ExtractError> {
    let io_err = |source| ExtractError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if keep(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths)
}
