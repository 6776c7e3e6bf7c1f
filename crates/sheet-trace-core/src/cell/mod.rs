//! Cell-related types and utilities
//!
//! This module contains:
//! - [`ColumnId`] - A column identifier (e.g., "B"), independent of row
//! - [`CellAddress`] - A cell's location (e.g., "B2")
//! - [`CellValue`] - The raw content stored in a cell
//! - [`Scalar`] - A non-formula, non-empty cell value

mod address;
mod column;
mod value;

pub use address::CellAddress;
pub use column::ColumnId;
pub use value::{CellValue, Scalar, FORMULA_MARKER};
