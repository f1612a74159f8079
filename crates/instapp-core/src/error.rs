use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures while decoding A1 addresses and ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AddressError {
    /// A column label contained something other than ASCII letters
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// A range token did not split into a column run and a row run
    #[error("malformed range: {0}")]
    MalformedRange(String),
    /// Single-letter column encoding only covers indices 0..=25
    #[error("column index {0} is out of range for a single-letter column")]
    ColumnOutOfRange(u32),
}

/// Rejected user input (form submissions, sweep parameters, uploads).
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("field '{field}' expects a number, got '{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("field '{field}' expects a date (YYYY-MM-DD), got '{value}'")]
    InvalidDate { field: String, value: String },

    #[error("invalid sweep: {0}")]
    InvalidSweep(String),

    #[error("{0}")]
    Other(String),
}
