//! Regex field extraction from permit text.
//!
//! [`FieldExtractor`] compiles the seven configured patterns once and is
//! then shared read-only across every concurrent archive walk. Each field
//! is searched independently; a pattern that does not match leaves its
//! field empty.

use chrono::NaiveDate;
use regex::Regex;
use zipwise_extract_models::Record;

use crate::ExtractError;
use crate::config::PatternConfig;

const ISO_DATE: &str = "%Y-%m-%d";
const DMY_DATE: &str = "%d-%m-%Y";

/// A matched value that could not be normalized.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// The text matched the date pattern but is not a real calendar date.
    #[error("{field} value '{value}' is not a valid date: {source}")]
    InvalidDate {
        /// Output column the value belonged to.
        field: &'static str,
        /// The matched text.
        value: String,
        /// Underlying parse error.
        source: chrono::ParseError,
    },
}

/// Compiled field patterns.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    issue_date: Regex,
    duration: Regex,
    entry_type: Regex,
    nationality: Regex,
    name: Regex,
    passport_number: Regex,
    date_of_birth: Regex,
}

impl FieldExtractor {
    /// Compiles the configured patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Regex`] if a pattern does not compile, or
    /// [`ExtractError::Config`] if it has no capture group.
    pub fn new(patterns: &PatternConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            issue_date: compile("issue_date", &patterns.issue_date)?,
            duration: compile("duration", &patterns.duration)?,
            entry_type: compile("entry_type", &patterns.entry_type)?,
            nationality: compile("nationality", &patterns.nationality)?,
            name: compile("name", &patterns.name)?,
            passport_number: compile("passport_number", &patterns.passport_number)?,
            date_of_birth: compile("date_of_birth", &patterns.date_of_birth)?,
        })
    }

    /// Extracts a [`Record`] from `text`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidDate`] if a date pattern matched text
    /// that is not a real `YYYY-MM-DD` date.
    pub fn extract(
        &self,
        text: &str,
        source_path: &str,
        has_companion: bool,
    ) -> Result<Record, FieldError> {
        let mut record = Record::empty(source_path, has_companion);

        if let Some(date) = first_group(&self.issue_date, text) {
            record.issue_date = reformat_date("DATE", date)?;
        }
        if let Some(days) = first_group(&self.duration, text) {
            record.duration = format!("{days} Days");
        }
        if let Some(entry) = first_group(&self.entry_type, text) {
            entry.clone_into(&mut record.entry_type);
        }
        if let Some(nationality) = first_group(&self.nationality, text) {
            nationality.clone_into(&mut record.nationality);
        }
        if let Some(name) = first_group(&self.name, text) {
            record.name = first_two_tokens(name);
        }
        if let Some(passport) = first_group(&self.passport_number, text) {
            passport.clone_into(&mut record.passport_number);
        }
        if let Some(dob) = first_group(&self.date_of_birth, text) {
            record.date_of_birth = reformat_date("DOB", dob)?;
        }

        log::trace!("Extracted {record:?}");

        Ok(record)
    }
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, ExtractError> {
    let re = Regex::new(pattern).map_err(|source| ExtractError::Regex { field, source })?;
    if re.captures_len() < 2 {
        return Err(ExtractError::Config(format!(
            "pattern for {field} needs a capture group: {pattern}"
        )));
    }
    Ok(re)
}

fn first_group<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Keeps the first two whitespace-separated tokens, joined by one space.
fn first_two_tokens(name: &str) -> String {
    name.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

/// Converts `YYYY-MM-DD` to `DD-MM-YYYY`.
///
/// # Errors
///
/// Returns [`FieldError::InvalidDate`] if `value` is not a real date in
/// `YYYY-MM-DD` form.
pub fn reformat_date(field: &'static str, value: &str) -> Result<String, FieldError> {
    NaiveDate::parse_from_str(value, ISO_DATE)
        .map(|date| date.format(DMY_DATE).to_string())
        .map_err(|source| FieldError::InvalidDate {
            field,
            value: value.to_string(),
            source,
        })
}

/// Converts `DD-MM-YYYY` back to `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns [`FieldError::InvalidDate`] if `value` is not a real date in
/// `DD-MM-YYYY` form.
pub fn to_iso_date(field: &'static str, value: &str) -> Result<String, FieldError> {
    NaiveDate::parse_from_str(value, DMY_DATE)
        .map(|date| date.format(ISO_DATE).to_string())
        .map_err(|source| FieldError::InvalidDate {
            field,
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;

    const PERMIT_TEXT: &str = "\
New Tourism Entry Permit
Created Date: 2025-04-05
Duration 30 Days
Entry Single Entry
Current Nationality USA
Applicant: JOHN SMITH
Passport Number Z1234567
Date of Birth 1990-01-01
";

    fn extractor() -> FieldExtractor {
        FieldExtractor::new(&ExtractConfig::default().patterns).unwrap()
    }

    #[test]
    fn extracts_every_field() {
        let record = extractor()
            .extract(PERMIT_TEXT, "05.04.2025/Z1234567/permit.pdf", false)
            .unwrap();

        assert_eq!(record.file_name, "05.04.2025/Z1234567/permit.pdf");
        assert_eq!(record.issue_date, "05-04-2025");
        assert_eq!(record.duration, "30 Days");
        assert_eq!(record.entry_type, "Single Entry");
        assert_eq!(record.nationality, "USA");
        assert_eq!(record.name, "JOHN SMITH");
        assert_eq!(record.passport_number, "Z1234567");
        assert_eq!(record.date_of_birth, "01-01-1990");
        assert!(!record.has_companion);
    }

    #[test]
    fn empty_text_yields_empty_record() {
        let record = extractor().extract("", "x.pdf", true).unwrap();
        assert!(record.is_blank());
        assert!(record.has_companion);
    }

    #[test]
    fn missing_label_only_clears_its_own_field() {
        let full = extractor().extract(PERMIT_TEXT, "x.pdf", false).unwrap();

        let without_passport = PERMIT_TEXT.replace("Passport Number Z1234567\n", "");
        let partial = extractor()
            .extract(&without_passport, "x.pdf", false)
            .unwrap();

        assert_eq!(partial.passport_number, "");
        assert_eq!(
            Record {
                passport_number: String::new(),
                ..full
            },
            partial
        );
    }

    #[test]
    fn name_keeps_first_two_tokens() {
        let record = extractor()
            .extract("Applicant:  MARIA  DEL CARMEN LOPEZ\n", "x.pdf", false)
            .unwrap();
        assert_eq!(record.name, "MARIA DEL");
    }

    #[test]
    fn name_stops_at_lowercase_text() {
        let record = extractor()
            .extract("Applicant: JANE DOE\nPassport Number X1\n", "x.pdf", false)
            .unwrap();
        assert_eq!(record.name, "JANE DOE");
    }

    #[test]
    fn multiple_entry_is_verbatim() {
        let record = extractor()
            .extract("Entry Multiple Entry", "x.pdf", false)
            .unwrap();
        assert_eq!(record.entry_type, "Multiple Entry");
    }

    #[test]
    fn impossible_date_is_an_error() {
        let err = extractor()
            .extract("Created Date: 2025-02-30", "x.pdf", false)
            .unwrap_err();
        let FieldError::InvalidDate { field, value, .. } = err;
        assert_eq!(field, "DATE");
        assert_eq!(value, "2025-02-30");
    }

    #[test]
    fn date_reformat_round_trips() {
        for iso in ["2025-04-05", "1990-01-01", "2024-02-29", "1978-03-25"] {
            let dmy = reformat_date("DATE", iso).unwrap();
            assert_eq!(to_iso_date("DATE", &dmy).unwrap(), iso);
        }
        assert_eq!(reformat_date("DOB", "1978-03-25").unwrap(), "25-03-1978");
    }

    #[test]
    fn rejects_pattern_without_group() {
        let mut patterns = ExtractConfig::default().patterns;
        patterns.duration = r"Duration \d+ Days".to_string();
        let err = FieldExtractor::new(&patterns).unwrap_err();
        assert!(matches!(err, ExtractError::Config(_)), "got {err:?}");
    }

    #[test]
    fn rejects_invalid_pattern() {
        let mut patterns = ExtractConfig::default().patterns;
        patterns.name = r"Applicant:(".to_string();
        let err = FieldExtractor::new(&patterns).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Regex {
                field: "name",
                ..
            }
        ));
    }
}
