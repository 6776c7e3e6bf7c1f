//! # sheet-trace-core
//!
//! Core data structures for the sheet-trace column auditing tools.
//!
//! This crate provides the fundamental types used throughout sheet-trace:
//! - [`ColumnId`] - A normalized column letter identifier
//! - [`CellAddress`] - Cell addressing in A1 notation
//! - [`CellValue`] and [`Scalar`] - Raw cell contents
//! - [`Workbook`], [`Worksheet`] - A sparse in-memory grid
//! - [`SheetSource`] - The read-only view the analysis consumes
//!
//! ## Example
//!
//! ```rust
//! use sheet_trace_core::{ColumnId, SheetSource, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", "Price").unwrap();
//! sheet.set_cell_value("A2", 10.0).unwrap();
//! sheet.set_cell_formula("B2", "=A2*2").unwrap();
//!
//! let b = ColumnId::parse("B").unwrap();
//! assert!(workbook.is_formula_cell("Sheet1", 1, b));
//! ```

pub mod cell;
pub mod error;
pub mod source;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CellAddress, CellValue, ColumnId, Scalar, FORMULA_MARKER};
pub use error::{Error, Result};
pub use source::SheetSource;
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
