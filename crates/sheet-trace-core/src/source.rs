//! Read-only access to sheet contents
//!
//! The dependency analysis never needs more than three questions answered:
//! which sheets exist, how wide each one is, and what a given cell holds.
//! [`SheetSource`] captures exactly that, so the analysis can run over an
//! in-memory [`Workbook`] or any other backing store.

use crate::cell::{CellValue, ColumnId};
use crate::workbook::Workbook;

/// A read-only view over a set of named sheets.
///
/// Rows are 0-based. Implementations must be shareable across threads so a
/// single source can serve concurrent traces.
pub trait SheetSource: Sync {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Number of columns in use on `sheet`, or `None` if the sheet is unknown
    fn column_count(&self, sheet: &str) -> Option<u16>;

    /// Raw content of one cell; unknown sheets and unwritten cells are empty
    fn cell_content(&self, sheet: &str, row: u32, col: ColumnId) -> CellValue;

    /// Whether `sheet` exists
    fn has_sheet(&self, sheet: &str) -> bool {
        self.column_count(sheet).is_some()
    }

    /// Whether the cell holds a formula
    fn is_formula_cell(&self, sheet: &str, row: u32, col: ColumnId) -> bool {
        self.cell_content(sheet, row, col).is_formula()
    }
}

impl SheetSource for Workbook {
    fn sheet_names(&self) -> Vec<String> {
        Workbook::sheet_names(self)
    }

    fn column_count(&self, sheet: &str) -> Option<u16> {
        self.worksheet_by_name(sheet).map(|ws| ws.column_count())
    }

    fn cell_content(&self, sheet: &str, row: u32, col: ColumnId) -> CellValue {
        self.worksheet_by_name(sheet)
            .map(|ws| ws.get_value_at(row, col.index()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_workbook_source() {
        let mut wb = Workbook::new();
        let ws = wb.worksheet_mut(0).unwrap();
        ws.set_cell_value("A1", "Qty").unwrap();
        ws.set_cell_formula("C2", "=A2*B2").unwrap();

        let a = ColumnId::parse("A").unwrap();
        let c = ColumnId::parse("C").unwrap();

        assert!(wb.has_sheet("Sheet1"));
        assert!(!wb.has_sheet("Missing"));
        assert_eq!(SheetSource::column_count(&wb, "Sheet1"), Some(3));
        assert_eq!(wb.cell_content("Sheet1", 0, a), CellValue::string("Qty"));
        assert_eq!(wb.cell_content("Missing", 0, a), CellValue::Empty);
        assert!(wb.is_formula_cell("Sheet1", 1, c));
        assert!(!wb.is_formula_cell("Sheet1", 0, a));
    }
}
