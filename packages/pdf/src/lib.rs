#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PDF text extraction for permit documents.
//!
//! Permit PDFs are read with pure-Rust text extraction ([`pdf_extract`]).
//! The [`TextSource`] trait is the seam the archive walker reads through,
//! so alternate readers can be swapped in without touching the walk logic.
//!
//! [`read_text_with_timeout`] runs a read on tokio's blocking pool and gives
//! up after a deadline so a pathological document cannot stall a worker.

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Errors specific to reading document text.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// The document could not be opened or read from disk.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// Extraction did not finish within the allotted time.
    #[error("PDF extraction timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that can turn a document on disk into plain text.
///
/// Implementations must be `Send + Sync` so a single reader can be shared
/// across concurrent archive walks behind an [`Arc`].
pub trait TextSource: Send + Sync {
    /// Returns the text of every page of the document at `path`, in
    /// document order.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the document cannot be opened or parsed.
    fn read_text(&self, path: &Path) -> Result<String, PdfError>;
}

/// Reads PDF documents with [`pdf_extract`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextReader;

impl TextSource for PdfTextReader {
    fn read_text(&self, path: &Path) -> Result<String, PdfError> {
        let bytes = std::fs::read(path)?;

        log::trace!("Read {} bytes from {}", bytes.len(), path.display());

        // lopdf panics on some malformed inputs instead of returning an error
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| PdfError::Extraction("PDF parser panicked on malformed document".into()))?
            .map_err(|e| PdfError::Extraction(format!("failed to extract text from PDF: {e}")))?;

        log::trace!(
            "Extracted {} characters of text from {}",
            text.len(),
            path.display()
        );

        Ok(text)
    }
}

/// Reads `path` through `source` on the blocking thread pool, giving up
/// after `timeout`.
///
/// A read that times out keeps running on its blocking thread until it
/// finishes; its result is discarded.
///
/// # Errors
///
/// Returns [`PdfError::Timeout`] if the deadline passes, or whatever the
/// reader returned. A panicking reader is reported as
/// [`PdfError::Extraction`].
pub async fn read_text_with_timeout(
    source: Arc<dyn TextSource>,
    path: PathBuf,
    timeout: Duration,
) -> Result<String, PdfError> {
    let task = tokio::task::spawn_blocking(move || source.read_text(&path));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(PdfError::Extraction(format!("reader task failed: {e}"))),
        Err(_) => Err(PdfError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::minimal_pdf;

    struct SlowReader(Duration);

    impl TextSource for SlowReader {
        fn read_text(&self, _path: &Path) -> Result<String, PdfError> {
            std::thread::sleep(self.0);
            Ok("late".to_string())
        }
    }

    struct PanickingReader;

    impl TextSource for PanickingReader {
        fn read_text(&self, _path: &Path) -> Result<String, PdfError> {
            panic!("reader blew up");
        }
    }

    #[test]
    fn extracts_text_from_generated_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permit.pdf");
        std::fs::write(
            &path,
            minimal_pdf(&["Passport Number Z1234567", "Duration 30 Days"]),
        )
        .unwrap();

        let text = PdfTextReader.read_text(&path).unwrap();

        assert!(text.contains("Passport Number Z1234567"), "got: {text:?}");
        assert!(text.contains("Duration 30 Days"), "got: {text:?}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfTextReader
            .read_text(&dir.path().join("nope.pdf"))
            .unwrap_err();
        assert!(matches!(err, PdfError::Io(_)));
    }

    #[test]
    fn garbage_bytes_are_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();

        let err = PdfTextReader.read_text(&path).unwrap_err();
        assert!(matches!(err, PdfError::Extraction(_)));
    }

    #[tokio::test]
    async fn times_out_slow_reader() {
        let source: Arc<dyn TextSource> = Arc::new(SlowReader(Duration::from_millis(500)));
        let err = read_text_with_timeout(source, PathBuf::from("x.pdf"), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::Timeout(_)));
    }

    #[tokio::test]
    async fn returns_text_within_deadline() {
        let source: Arc<dyn TextSource> = Arc::new(SlowReader(Duration::from_millis(1)));
        let text = read_text_with_timeout(source, PathBuf::from("x.pdf"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(text, "late");
    }

    #[tokio::test]
    async fn panicking_reader_is_extraction_error() {
        let source: Arc<dyn TextSource> = Arc::new(PanickingReader);
        let err = read_text_with_timeout(source, PathBuf::from("x.pdf"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::Extraction(_)));
    }
}
