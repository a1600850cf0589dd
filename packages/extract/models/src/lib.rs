#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record, report, and summary types for permit extraction.
//!
//! A [`Record`] is one output row extracted from one permit document. The
//! archive walker produces an [`ArchiveReport`] per archive, and the batch
//! orchestrator folds those into a [`BatchSummary`] wrapped in a
//! [`BatchOutcome`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Column headers of the output table, in order.
pub const COLUMNS: [&str; 9] = [
    "File Name",
    "DATE",
    "TYPE DR",
    "TYPE OP",
    "NATIONALITY",
    "NAME",
    "PASSPORT NO",
    "DOB",
    "Folder Contains Multiple Files",
];

/// One row of extracted permit data.
///
/// Every text field is empty when its pattern did not match. Dates are
/// already reformatted to `DD-MM-YYYY`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Path of the permit document the record was extracted from.
    #[serde(rename = "File Name")]
    pub file_name: String,
    /// Permit issue date (`DD-MM-YYYY`).
    #[serde(rename = "DATE")]
    pub issue_date: String,
    /// Permit duration, e.g. `"30 Days"`.
    #[serde(rename = "TYPE DR")]
    pub duration: String,
    /// `"Single Entry"` or `"Multiple Entry"`.
    #[serde(rename = "TYPE OP")]
    pub entry_type: String,
    /// Uppercase nationality code.
    #[serde(rename = "NATIONALITY")]
    pub nationality: String,
    /// First two tokens of the applicant name.
    #[serde(rename = "NAME")]
    pub name: String,
    /// Passport number.
    #[serde(rename = "PASSPORT NO")]
    pub passport_number: String,
    /// Applicant date of birth (`DD-MM-YYYY`).
    #[serde(rename = "DOB")]
    pub date_of_birth: String,
    /// Whether the record folder also holds the companion document.
    #[serde(rename = "Folder Contains Multiple Files")]
    pub has_companion: bool,
}

impl Record {
    /// Creates a record with every extracted field empty.
    #[must_use]
    pub fn empty(file_name: impl Into<String>, has_companion: bool) -> Self {
        Self {
            file_name: file_name.into(),
            has_companion,
            ..Self::default()
        }
    }

    /// Returns `true` if no field was extracted from the document text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.issue_date.is_empty()
            && self.duration.is_empty()
            && self.entry_type.is_empty()
            && self.nationality.is_empty()
            && self.name.is_empty()
            && self.passport_number.is_empty()
            && self.date_of_birth.is_empty()
    }
}

/// A permit document that did not yield a clean record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIssue {
    /// Path of the document.
    pub path: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

/// Result of walking a single archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveReport {
    /// Path of the archive that was walked.
    pub archive: PathBuf,
    /// Records in walk order (date folder, record folder, file name).
    pub records: Vec<Record>,
    /// Documents whose text could not be read. Each still produced an
    /// all-empty record in [`Self::records`].
    pub unreadable: Vec<DocumentIssue>,
    /// Documents whose record was dropped (e.g. an impossible calendar
    /// date).
    pub rejected: Vec<DocumentIssue>,
}

impl ArchiveReport {
    /// Creates an empty report for `archive`.
    #[must_use]
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            ..Self::default()
        }
    }
}

/// An archive that was skipped because it could not be walked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveFailure {
    /// Path of the archive.
    pub archive: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

/// Aggregate counts for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of archives discovered in the input directory.
    pub archives_found: u64,
    /// Number of archives walked successfully.
    pub archives_processed: u64,
    /// Archives skipped because of errors.
    pub archive_failures: Vec<ArchiveFailure>,
    /// Total records written (or that would have been written).
    pub total_records: u64,
    /// Records whose folder contained the companion document ("Type B").
    pub with_companion: u64,
    /// Records whose folder held only the permit ("Type A").
    pub without_companion: u64,
    /// Documents that could not be read.
    pub unreadable_documents: Vec<DocumentIssue>,
    /// Documents whose record was dropped.
    pub rejected_documents: Vec<DocumentIssue>,
    /// Output file, when one was written.
    pub output: Option<PathBuf>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Folds one archive report into the summary, returning its records.
    pub fn absorb(&mut self, report: ArchiveReport) -> Vec<Record> {
        self.archives_processed += 1;
        for record in &report.records {
            self.total_records += 1;
            if record.has_companion {
                self.with_companion += 1;
            } else {
                self.without_companion += 1;
            }
        }
        self.unreadable_documents.extend(report.unreadable);
        self.rejected_documents.extend(report.rejected);
        report.records
    }
}

/// Caller-visible result of a successful batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchOutcome {
    /// Records were extracted and the table was written.
    Written(BatchSummary),
    /// Nothing was extracted; no output file exists.
    NoData(BatchSummary),
}

impl BatchOutcome {
    /// Returns the summary regardless of outcome.
    #[must_use]
    pub const fn summary(&self) -> &BatchSummary {
        match self {
            Self::Written(summary) | Self::NoData(summary) => summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_fixed_column_headers() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .serialize(Record::empty("a/b/permit.pdf", true))
            .unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let header = out.lines().next().unwrap();

        assert_eq!(header, COLUMNS.join(","));
        assert_eq!(out.lines().nth(1).unwrap(), "a/b/permit.pdf,,,,,,,,true");
    }

    #[test]
    fn empty_record_is_blank() {
        let record = Record::empty("x.pdf", false);
        assert!(record.is_blank());
        assert!(!record.has_companion);

        let filled = Record {
            nationality: "USA".to_string(),
            ..record
        };
        assert!(!filled.is_blank());
    }

    #[test]
    fn absorb_counts_companion_flags() {
        let mut report = ArchiveReport::new("a.zip");
        report.records.push(Record::empty("1.pdf", true));
        report.records.push(Record::empty("2.pdf", false));
        report.records.push(Record::empty("3.pdf", false));
        report.unreadable.push(DocumentIssue {
            path: PathBuf::from("3.pdf"),
            reason: "broken".to_string(),
        });

        let mut summary = BatchSummary::default();
        let records = summary.absorb(report);

        assert_eq!(records.len(), 3);
        assert_eq!(summary.archives_processed, 1);
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.with_companion, 1);
        assert_eq!(summary.without_companion, 2);
        assert_eq!(summary.unreadable_documents.len(), 1);
    }
}
