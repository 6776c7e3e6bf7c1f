//! # sheet-trace
//!
//! Trace how a spreadsheet column is computed, from formula text alone.
//!
//! Given a workbook laid out with a header row and a representative formula
//! row, sheet-trace follows each column's formula back through the columns
//! it reads, across sheets and through VLOOKUP and INDEX/MATCH lookups, and
//! returns the result as a tree for auditing. Nothing is ever evaluated.
//!
//! ## Features
//!
//! - Open XLSX workbooks and CSV files (or a directory of them)
//! - Resolve columns to their header labels and formula-row content
//! - Build cycle-safe dependency trees with a depth limit
//! - Show formulas with header labels in place of references
//! - Render trees as text, HTML or JSON
//!
//! ## Example
//!
//! ```rust
//! use sheet_trace::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! // Header row, then the formula row
//! sheet.set_cell_value("A1", "Qty").unwrap();
//! sheet.set_cell_value("B1", "Price").unwrap();
//! sheet.set_cell_value("C1", "Total").unwrap();
//! sheet.set_cell_value("A2", 3.0).unwrap();
//! sheet.set_cell_value("B2", 2.5).unwrap();
//! sheet.set_cell_formula("C2", "=A2*B2").unwrap();
//!
//! let resolver = ColumnResolver::new(&workbook);
//! let tree = TreeBuilder::new(&resolver, TraceOptions::default())
//!     .build("Sheet1", ColumnId::parse("C").unwrap())
//!     .unwrap();
//!
//! println!("{}", render_text(&tree));
//! // [Sheet1] Total (C) =Qty*Price
//! // ├── [Sheet1] Qty (A) = 3
//! // └── [Sheet1] Price (B) = 2.5
//! ```

pub mod builder;
pub mod error;
pub mod prelude;
pub mod render;
pub mod resolver;

pub use builder::{
    build_tree, CancellationToken, ColumnSelector, DependencyNode, Edge, LookupValueRows,
    Terminal, TraceOptions, TreeBuilder, Walk, DEFAULT_MAX_DEPTH,
};
pub use error::{TraceError, TraceResult};
pub use render::{node_label, render_html, render_json, render_text};
pub use resolver::{ColumnContent, ColumnInfo, ColumnResolver, RowConfig, SheetColumns};

// Re-export core types
pub use sheet_trace_core::{
    CellAddress, CellValue, ColumnId, Error, Result, Scalar, SheetSource, Workbook, Worksheet,
    FORMULA_MARKER, MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};

// Re-export formula types
pub use sheet_trace_formula::{
    extract, render as render_readable, scan, LookupRole, Reference, ReferenceKind,
};

// Re-export I/O types
pub use sheet_trace_csv::{CsvError, CsvReadOptions, CsvReader};
pub use sheet_trace_xlsx::{XlsxError, XlsxReader};

use std::path::Path;

/// Extension trait for Workbook to add file loading
pub trait WorkbookExt {
    /// Open a workbook from a file.
    ///
    /// `.xlsx`/`.xlsm` files are read as Office Open XML, `.csv` files as a
    /// one-sheet workbook, and a directory as one sheet per `.csv` file.
    fn open<P: AsRef<Path>>(path: P) -> TraceResult<Workbook>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> TraceResult<Workbook> {
        let path = path.as_ref();
        if path.is_dir() {
            return Ok(CsvReader::read_dir(path, &CsvReadOptions::default())?);
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => Ok(XlsxReader::read_file(path)?),
            Some("csv") => Ok(CsvReader::read_file(path, &CsvReadOptions::default())?),
            _ => Err(TraceError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}
