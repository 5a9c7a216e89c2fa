//! Errors raised by ledger operations.
//!
//! These are always recoverable: the UI shows them as a warning and aborts
//! the current action. I/O and terminal failures go through `anyhow`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// Required input was missing or unusable
    #[error("{0}")]
    Validation(String),

    /// Text was supplied where a number is required
    #[error("{field} must be a number, got '{input}'")]
    Parse { field: &'static str, input: String },

    /// Analysis was requested with no recorded expenses
    #[error("No records available for analysis.")]
    EmptyLedger,
}

impl TrackerError {
    pub fn parse(field: &'static str, input: impl Into<String>) -> Self {
        Self::Parse {
            field,
            input: input.into(),
        }
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
