//! Extraction settings loaded from TOML.
//!
//! The defaults live in `config/default.toml`, which is baked into the
//! binary with [`include_str!`]. A user file is layered on top key by key,
//! so it only needs to mention what it changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ExtractError;

/// Default settings embedded at compile time.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Complete extraction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// One regex per extracted field.
    pub patterns: PatternConfig,
    /// Naming conventions inside the input directory and archives.
    pub layout: LayoutConfig,
    /// Concurrency and resource limits.
    pub runtime: RuntimeConfig,
}

/// Field patterns. Each must contain at least one capture group; group 1
/// is the extracted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Permit issue date, `YYYY-MM-DD`.
    pub issue_date: String,
    /// Permit duration in days.
    pub duration: String,
    /// Single or multiple entry.
    pub entry_type: String,
    /// Nationality code.
    pub nationality: String,
    /// Applicant name.
    pub name: String,
    /// Passport number.
    pub passport_number: String,
    /// Date of birth, `YYYY-MM-DD`.
    pub date_of_birth: String,
}

/// Input directory and archive layout conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Extension of the archives to pick up (without the dot).
    pub archive_extension: String,
    /// File name prefix identifying permit documents.
    pub permit_prefix: String,
    /// Extension of permit documents (without the dot).
    pub permit_extension: String,
    /// File whose presence in a record folder sets the companion flag.
    pub companion_file: String,
}

/// Concurrency and resource limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Maximum number of archives processed at once. `None` uses the
    /// available parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Seconds to wait for a single document before giving up on it.
    pub document_timeout_secs: u64,
    /// Directory that scratch extraction folders are created in. `None`
    /// uses the system temp directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ExtractConfig {
    /// Returns the embedded defaults.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `default.toml` is malformed, which the unit
    /// tests rule out.
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default.toml: {e}"))
    }
}

impl ExtractConfig {
    /// Loads the defaults, overlaid with the file at `path` when given.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Io`] if the file cannot be read, or
    /// [`ExtractError::ConfigParse`] / [`ExtractError::Config`] if it is
    /// not a valid configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, ExtractError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        log::debug!("Loading configuration from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|e| ExtractError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_toml_str(&contents).map_err(|e| match e {
            ExtractError::ConfigParse { source, .. } => ExtractError::ConfigParse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parses `contents` as an overlay on the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::ConfigParse`] if `contents` is not valid
    /// TOML or has fields of the wrong type, and [`ExtractError::Config`]
    /// if the resulting values are out of range.
    pub fn from_toml_str(contents: &str) -> Result<Self, ExtractError> {
        let parse_err = |source| ExtractError::ConfigParse {
            path: "<inline>".to_string(),
            source,
        };

        let mut base: toml::Table = DEFAULT_CONFIG.parse().map_err(parse_err)?;
        let overlay: toml::Table = contents.parse().map_err(parse_err)?;
        merge_tables(&mut base, overlay);

        let config: Self = toml::Value::Table(base).try_into().map_err(parse_err)?;
        config.validate()?;

        Ok(config)
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ExtractError> {
        toml::to_string(self).map_err(|e| ExtractError::Config(e.to_string()))
    }

    /// Checks values that TOML types alone cannot constrain.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.runtime.workers == Some(0) {
            return Err(ExtractError::Config(
                "runtime.workers must be at least 1".to_string(),
            ));
        }
        if self.runtime.document_timeout_secs == 0 {
            return Err(ExtractError::Config(
                "runtime.document_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.layout.archive_extension.trim_start_matches('.').is_empty() {
            return Err(ExtractError::Config(
                "layout.archive_extension must not be empty".to_string(),
            ));
        }
        if self.layout.permit_prefix.is_empty() {
            return Err(ExtractError::Config(
                "layout.permit_prefix must not be empty".to_string(),
            ));
        }
        if self.layout.companion_file.is_empty() {
            return Err(ExtractError::Config(
                "layout.companion_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Upper bound on concurrently processed archives.
    #[must_use]
    pub fn worker_limit(&self) -> usize {
        self.runtime
            .workers
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, usize::from))
            .max(1)
    }

    /// Per-document read deadline.
    #[must_use]
    pub const fn document_timeout(&self) -> Duration {
        Duration::from_secs(self.runtime.document_timeout_secs)
    }

    /// Directory scratch folders are created in.
    #[must_use]
    pub fn scratch_root(&self) -> PathBuf {
        self.runtime
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Recursively overlays `overlay` onto `base`. Tables merge; every other
/// value replaces.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(overlay_table) = value {
            if let Some(toml::Value::Table(base_table)) = base.get_mut(&key) {
                merge_tables(base_table, overlay_table);
            } else {
                base.insert(key, toml::Value::Table(overlay_table));
            }
        } else {
            base.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let config = ExtractConfig::default();
        assert_eq!(config.layout.archive_extension, "zip");
        assert_eq!(config.layout.permit_prefix, "New Tourism Entry Permit");
        assert_eq!(config.layout.companion_file, "eVisa.pdf");
        assert_eq!(config.runtime.workers, None);
        assert_eq!(config.document_timeout(), Duration::from_secs(60));
        config.validate().unwrap();
    }

    #[test]
    fn overlay_keeps_unmentioned_defaults() {
        let config = ExtractConfig::from_toml_str(
            r#"
            [layout]
            companion_file = "Visa.pdf"

            [runtime]
            workers = 3
            "#,
        )
        .unwrap();

        let defaults = ExtractConfig::default();
        assert_eq!(config.layout.companion_file, "Visa.pdf");
        assert_eq!(config.layout.permit_prefix, defaults.layout.permit_prefix);
        assert_eq!(config.patterns, defaults.patterns);
        assert_eq!(config.worker_limit(), 3);
        assert_eq!(config.runtime.document_timeout_secs, 60);
    }

    #[test]
    fn empty_overlay_equals_defaults() {
        assert_eq!(
            ExtractConfig::from_toml_str("").unwrap(),
            ExtractConfig::default()
        );
    }

    #[test]
    fn rejects_zero_workers() {
        let err = ExtractConfig::from_toml_str("[runtime]\nworkers = 0\n").unwrap_err();
        assert!(matches!(err, ExtractError::Config(_)), "got {err:?}");
    }

    #[test]
    fn rejects_wrong_types() {
        let err =
            ExtractConfig::from_toml_str("[runtime]\ndocument_timeout_secs = \"soon\"\n")
                .unwrap_err();
        assert!(matches!(err, ExtractError::ConfigParse { .. }), "got {err:?}");
    }

    #[test]
    fn renders_back_to_toml() {
        let config = ExtractConfig::default();
        let rendered = config.to_toml_string().unwrap();
        assert_eq!(ExtractConfig::from_toml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn load_reads_overlay_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zipwise.toml");
        std::fs::write(&path, "[runtime]\ndocument_timeout_secs = 5\n").unwrap();

        let config = ExtractConfig::load(Some(&path)).unwrap();
        assert_eq!(config.document_timeout(), Duration::from_secs(5));

        let missing = ExtractConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(missing, ExtractError::Io { .. }));
    }
}
