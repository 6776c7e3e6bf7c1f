//! Prelude module - common imports for sheet-trace users
//!
//! ```rust
//! use sheet_trace::prelude::*;
//! ```

pub use crate::{
    // Tree building
    build_tree,
    // Cell types
    CellValue,
    ColumnContent,
    ColumnId,
    ColumnInfo,
    // Column resolution
    ColumnResolver,
    ColumnSelector,
    CsvReader,
    DependencyNode,
    Edge,
    LookupValueRows,
    // Rendering
    render_html,
    render_json,
    render_text,
    RowConfig,
    Scalar,
    SheetSource,
    Terminal,
    TraceError,
    TraceOptions,
    TraceResult,
    TreeBuilder,
    // Main types
    Workbook,
    // Extension traits
    WorkbookExt,
    Worksheet,
    // I/O types
    XlsxReader,
};
