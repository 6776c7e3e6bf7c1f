//! Error types for dependency tracing

use std::path::PathBuf;

use thiserror::Error;

/// Result type for tracing operations
pub type TraceResult<T> = std::result::Result<T, TraceError>;

/// Errors that abort a trace.
///
/// Problems inside the formulas themselves never show up here: malformed
/// references are skipped, and cycles, depth cut-offs and references to
/// missing sheets become terminal nodes in the tree.
#[derive(Debug, Error)]
pub enum TraceError {
    /// Invalid header/formula row configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The requested sheet does not exist
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// No column carries the requested header
    #[error("No column with header '{header}' on sheet '{sheet}'")]
    ColumnNotFound { sheet: String, header: String },

    /// The trace was cancelled through its [`CancellationToken`](crate::CancellationToken)
    #[error("Trace cancelled")]
    Cancelled,

    /// File type that no reader handles
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] sheet_trace_core::Error),

    /// XLSX reading error
    #[error(transparent)]
    Xlsx(#[from] sheet_trace_xlsx::XlsxError),

    /// CSV reading error
    #[error(transparent)]
    Csv(#[from] sheet_trace_csv::CsvError),

    /// JSON export error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
