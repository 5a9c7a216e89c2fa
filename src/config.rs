use crate::storage::Storage;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LOG_FILE_NAME: &str = "expense_tracker.log";

#[derive(Debug, Parser)]
#[command(
    name = "expense-tracker",
    version,
    about = "Record expenses, set a monthly target and see where the money goes"
)]
pub struct Cli {
    /// Where the expense data is stored
    #[arg(long, env = "EXPENSE_TRACKER_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Where log output is written (defaults to a file next to the data)
    #[arg(long, env = "EXPENSE_TRACKER_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record an expense
    Add {
        category: String,
        /// Plain number, no currency sign
        amount: String,
    },
    /// Print totals, mean, remaining budget and per-category spend
    Summary,
    /// List recorded expenses, newest first
    Records,
    /// Set the monthly target (0 clears it)
    Target { value: String },
    /// Erase all data
    Reset,
    /// Show where data and logs are kept
    Path,
}

/// Resolved file locations.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_file: PathBuf,
    pub log_file: PathBuf,
}

impl Cli {
    pub fn settings(&self) -> Result<Settings> {
        let data_file = match &self.data_file {
            Some(path) => path.clone(),
            None => Storage::default_path()?,
        };
        let log_file = self
            .log_file
            .clone()
            .unwrap_or_else(|| data_file.with_file_name(LOG_FILE_NAME));
        Ok(Settings {
            data_file,
            log_file,
        })
    }
}
