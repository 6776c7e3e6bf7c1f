//! # sheet-trace-csv
//!
//! CSV reader for sheet-trace.
//!
//! A single file loads as a one-sheet workbook named after the file stem. A
//! directory of `.csv` files loads as one workbook with a sheet per file,
//! ordered by file name. Fields starting with `=` are kept verbatim, so they
//! count as formulas.

mod error;
mod options;
mod reader;

pub use error::{CsvError, CsvResult};
pub use options::CsvReadOptions;
pub use reader::CsvReader;
