//! CSV output.
//!
//! The table is written to a sibling `.tmp` file and renamed into place, so
//! the output path either holds a complete table or is left untouched.

use std::path::{Path, PathBuf};

use zipwise_extract_models::Record;

use crate::ExtractError;

/// Writes `records` to `output` as CSV with the fixed column headers.
///
/// Nothing is written when `records` is empty. Returns the number of rows
/// written.
///
/// # Errors
///
/// Returns [`ExtractError::Output`] if the file cannot be created or
/// renamed, or [`ExtractError::Csv`] if a row fails to serialize.
pub fn write_records(records: &[Record], output: &Path) -> Result<u64, ExtractError> {
    if records.is_empty() {
        log::debug!("No records; not writing {}", output.display());
        return Ok(0);
    }

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| ExtractError::Output {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let tmp_path = temp_path_for(output);

    if let Err(e) = write_csv(records, &tmp_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    std::fs::rename(&tmp_path, output).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        ExtractError::Output {
            path: output.display().to_string(),
            source: e,
        }
    })?;

    log::info!("Wrote {} rows to {}", records.len(), output.display());

    Ok(records.len() as u64)
}

fn write_csv(records: &[Record], path: &Path) -> Result<(), ExtractError> {
    let csv_err = |source| ExtractError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| ExtractError::Output {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

fn temp_path_for(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zipwise_extract_models::COLUMNS;

    fn sample(name: &str, companion: bool) -> Record {
        Record {
            file_name: format!("05.04.2025/{name}/New Tourism Entry Permit.pdf"),
            issue_date: "05-04-2025".to_string(),
            duration: "30 Days".to_string(),
            entry_type: "Single Entry".to_string(),
            nationality: "USA".to_string(),
            name: "JOHN SMITH".to_string(),
            passport_number: name.to_string(),
            date_of_birth: "01-01-1990".to_string(),
            has_companion: companion,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("Output.csv");

        let written =
            write_records(&[sample("Z1", false), sample("Z2", true)], &output).unwrap();
        assert_eq!(written, 2);

        let contents = std::fs::read_to_string(&output).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "05.04.2025/Z1/New Tourism Entry Permit.pdf,05-04-2025,30 Days,Single Entry,USA,JOHN SMITH,Z1,01-01-1990,false"
        );
        assert!(lines.next().unwrap().ends_with(",true"));
        assert!(lines.next().is_none());

        assert!(!temp_path_for(&output).exists());
    }

    #[test]
    fn quotes_delimiters_in_values() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("Output.csv");
        let mut record = sample("Z1", false);
        record.file_name = "a,b/permit.pdf".to_string();

        write_records(&[record.clone()], &output).unwrap();

        let mut reader = csv::Reader::from_path(&output).unwrap();
        let back: Vec<Record> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(back, vec![record]);
    }

    #[test]
    fn empty_records_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("Output.csv");

        assert_eq!(write_records(&[], &output).unwrap(), 0);
        assert!(!output.exists());
    }

    #[test]
    fn unwritable_target_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        // Parent path is a file, so the directory cannot be created.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let output = blocker.join("Output.csv");

        let err = write_records(&[sample("Z1", false)], &output).unwrap_err();
        assert!(matches!(err, ExtractError::Output { .. }), "got {err:?}");
    }
}
