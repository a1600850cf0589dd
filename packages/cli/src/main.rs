#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for zipwise.
//!
//! `zipwise extract <DIR>` runs a batch non-interactively. With no
//! subcommand, an interactive prompt asks for the ZIP folder and output
//! file instead.
//!
//! Uses `indicatif-log-bridge` (via [`zipwise_cli_utils::init_logger`]) so
//! log lines and the progress bar never fight for the terminal.

mod extract;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::extract::ConfigOverrides;

#[derive(Parser)]
#[command(
    name = "zipwise",
    about = "Extract visa permit fields from ZIP archives of PDF documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract permit data from every ZIP archive in a folder
    Extract {
        /// Folder containing the ZIP archives (not searched recursively)
        input: PathBuf,
        /// CSV file to write
        #[arg(long, short, default_value = "Output.csv")]
        output: PathBuf,
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
    /// Print the effective configuration as TOML
    Config {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = zipwise_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Extract {
            input,
            output,
            overrides,
        } => {
            let config = overrides.load()?;
            extract::execute(&input, &output, &config, &multi).await?;
        }
        Commands::Config { overrides } => {
            let config = overrides.load()?;
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
