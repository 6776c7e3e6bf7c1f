//! # sheet-trace-formula
//!
//! Best-effort reference extraction from spreadsheet formula text.
//!
//! This crate provides:
//! - A tokenizer that never fails on malformed input
//! - Reference extraction (cells, column/cell ranges, sheet qualifiers) with
//!   VLOOKUP and INDEX/MATCH argument roles
//! - Readable rendering that swaps reference spans for header labels
//!
//! It does not parse formulas into an expression tree and never evaluates
//! anything.
//!
//! ## Example
//!
//! ```rust
//! use sheet_trace_formula::{extract, ReferenceKind};
//!
//! let refs = extract("=SUM(A:C)+\"B2\"", "Sheet1");
//! assert_eq!(refs.len(), 1);
//! assert_eq!(refs[0].kind, ReferenceKind::ColumnRange);
//! assert_eq!(refs[0].columns.len(), 3);
//! ```

pub mod extract;
pub mod reference;
pub mod substitute;
pub mod tokenizer;

pub use extract::{dedup, extract, scan};
pub use reference::{LookupRole, Reference, ReferenceKind};
pub use substitute::render;
pub use tokenizer::{tokenize, Token, TokenKind};
