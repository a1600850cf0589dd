#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Permit field extraction from ZIP archives of PDF documents.
//!
//! Each archive in an input directory is unpacked to a scratch directory
//! and walked as `<date folder>/<record folder>/<permit PDFs>`. Seven
//! labelled regexes pull the permit fields out of every document's text,
//! and the flattened records are written to a single CSV table.
//!
//! The primary entry point is [`run`]. The pieces it is built from
//! ([`fields::FieldExtractor`], [`archive::walk_archive`],
//! [`table::write_records`]) are public so they can be driven on their
//! own.

pub mod archive;
pub mod batch;
pub mod config;
pub mod fields;
pub mod progress;
pub mod table;

pub use batch::{discover_archives, run, run_with_reader};
pub use config::ExtractConfig;
pub use zipwise_extract_models as models;

/// Errors that can occur while extracting a batch.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The caller supplied an unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A configuration value is out of range or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configuration file is not valid TOML for [`ExtractConfig`].
    #[error("Invalid configuration in {path}: {source}")]
    ConfigParse {
        /// File the configuration came from.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A field pattern failed to compile.
    #[error("Invalid regex pattern for {field}: {source}")]
    Regex {
        /// Field the pattern belongs to.
        field: &'static str,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// The archive is corrupt or could not be unpacked.
    #[error("Archive error in {path}: {source}")]
    Archive {
        /// Path to the archive.
        path: String,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },

    /// I/O error reading the input or scratch directories.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The output table could not be written.
    #[error("Failed to write output {path}: {source}")]
    Output {
        /// Path of the output (or its temporary file).
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A row could not be serialized to CSV.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Path to the CSV file.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// A blocking worker task panicked or was cancelled.
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
