//! # sheet-trace-xlsx
//!
//! XLSX (Office Open XML) reader for sheet-trace.
//!
//! Only what column auditing needs is read: sheet names in workbook order,
//! shared strings, and each cell's value or formula text. Styles, comments,
//! charts and the rest of the package are skipped.

pub mod error;
pub mod reader;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
