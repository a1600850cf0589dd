//! Interactive prompt for running one extraction without memorizing flags.

use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input};
use zipwise_cli_utils::MultiProgress;
use zipwise_extract::{ExtractConfig, discover_archives};

const DEFAULT_OUTPUT: &str = "Output.csv";

/// Prompts for the ZIP folder and output file, then runs the batch.
///
/// # Errors
///
/// Returns an error if a prompt fails or the batch cannot complete.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let config = ExtractConfig::default();

    let folder: String = Input::new()
        .with_prompt("ZIP folder")
        .validate_with(|input: &String| check_folder(input))
        .interact_text()?;
    let folder = PathBuf::from(folder.trim());

    let archives = discover_archives(&folder, &config.layout.archive_extension)?;
    if archives.is_empty() {
        log::warn!("No ZIP files found in selected folder.");
        return Ok(());
    }

    let output: String = Input::new()
        .with_prompt("Output file")
        .default(DEFAULT_OUTPUT.to_string())
        .validate_with(|input: &String| {
            if input.trim().is_empty() {
                Err("Please select an output file.")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    let output = ensure_csv_extension(Path::new(output.trim()));

    let proceed = Confirm::new()
        .with_prompt(format!(
            "Extract {} archive(s) into {}?",
            archives.len(),
            output.display()
        ))
        .default(true)
        .interact()?;

    if !proceed {
        println!("Cancelled.");
        return Ok(());
    }

    crate::extract::execute(&folder, &output, &config, multi).await?;

    Ok(())
}

fn check_folder(input: &str) -> Result<(), &'static str> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Please select a ZIP folder.");
    }
    if !Path::new(input).is_dir() {
        return Err("Invalid folder path.");
    }
    Ok(())
}

/// Appends `.csv` when `path` has no extension.
fn ensure_csv_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_csv_extension_when_missing() {
        assert_eq!(
            ensure_csv_extension(Path::new("results")),
            PathBuf::from("results.csv")
        );
        assert_eq!(
            ensure_csv_extension(Path::new("out/report.csv")),
            PathBuf::from("out/report.csv")
        );
        assert_eq!(
            ensure_csv_extension(Path::new("report.txt")),
            PathBuf::from("report.txt")
        );
    }

    #[test]
    fn folder_validation() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.zip");
        std::fs::write(&file, b"").unwrap();

        assert_eq!(check_folder("  "), Err("Please select a ZIP folder."));
        assert_eq!(
            check_folder(&file.display().to_string()),
            Err("Invalid folder path.")
        );
        assert_eq!(check_folder(&dir.path().display().to_string()), Ok(()));
    }
}
