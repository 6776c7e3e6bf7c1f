//! CSV error types

use std::path::PathBuf;

use thiserror::Error;

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur during CSV reading
#[derive(Debug, Error)]
pub enum CsvError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A path that cannot name a sheet
    #[error("Cannot derive a sheet name from {0}")]
    InvalidPath(PathBuf),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] sheet_trace_core::Error),
}
