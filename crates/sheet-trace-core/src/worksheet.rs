//! Worksheet type

use ahash::AHashMap;

use crate::cell::{CellAddress, CellValue};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
///
/// Cells are stored sparsely, keyed by 0-based `(row, col)`.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Non-empty cells
    cells: AHashMap<(u32, u16), CellValue>,
    /// One past the right-most column ever written
    column_count: u16,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: AHashMap::new(),
            column_count: 0,
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    // === Cell Access ===

    /// Get cell value (convenience method)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col.index()))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells.get(&(row, col)).cloned().unwrap_or_default()
    }

    /// Number of columns in use (index of the right-most written column + 1)
    pub fn column_count(&self) -> u16 {
        self.column_count
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col.index(), value)
    }

    /// Set a cell value by row and column indices
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        let value = value.into();
        if matches!(value, CellValue::Empty) {
            self.cells.remove(&(row, col));
            return Ok(());
        }
        self.cells.insert((row, col), value);
        self.column_count = self.column_count.max(col + 1);
        Ok(())
    }

    /// Set a cell formula by address string
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_formula_at(addr.row, addr.col.index(), formula)
    }

    /// Set a cell formula by row and column indices
    pub fn set_cell_formula_at(&mut self, row: u32, col: u16, formula: &str) -> Result<()> {
        self.set_cell_value_at(row, col, CellValue::formula(formula))
    }

    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS - 1));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_and_get() {
        let mut ws = Worksheet::new("Data");
        ws.set_cell_value("A1", "Price").unwrap();
        ws.set_cell_value("B2", 3.5).unwrap();
        ws.set_cell_formula("C2", "A2*B2").unwrap();

        assert_eq!(ws.get_value("A1").unwrap(), CellValue::string("Price"));
        assert_eq!(ws.get_value_at(1, 1), CellValue::Number(3.5));
        assert_eq!(ws.get_value("C2").unwrap().formula_text(), Some("=A2*B2"));
        assert_eq!(ws.get_value_at(40, 40), CellValue::Empty);
    }

    #[test]
    fn test_column_count_tracks_widest_write() {
        let mut ws = Worksheet::new("Data");
        assert_eq!(ws.column_count(), 0);
        ws.set_cell_value("D7", 1.0).unwrap();
        assert_eq!(ws.column_count(), 4);
        ws.set_cell_value("B1", 1.0).unwrap();
        assert_eq!(ws.column_count(), 4);
        ws.set_cell_value("C9", CellValue::Empty).unwrap();
        assert_eq!(ws.column_count(), 4);
    }

    #[test]
    fn test_empty_value_clears() {
        let mut ws = Worksheet::new("Data");
        ws.set_cell_value_at(0, 0, 1.0).unwrap();
        ws.set_cell_value_at(0, 0, CellValue::Empty).unwrap();
        assert_eq!(ws.cell_count(), 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut ws = Worksheet::new("Data");
        assert!(ws.set_cell_value_at(MAX_ROWS, 0, 1.0).is_err());
        assert!(ws.set_cell_value_at(0, MAX_COLS, 1.0).is_err());
    }
}
