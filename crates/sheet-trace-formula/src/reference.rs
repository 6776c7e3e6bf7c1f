//! Structured references found in formula text

use std::ops::Range;

use sheet_trace_core::ColumnId;

/// What shape of reference was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// A single cell (`B2`) or a bare column word (`B`)
    Cell,
    /// Whole columns (`A:C`)
    ColumnRange,
    /// A rectangular block (`A1:C10`)
    CellRange,
}

/// The part a reference plays inside a lookup function call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LookupRole {
    /// Plain reference
    #[default]
    None,
    /// The table scanned by VLOOKUP or INDEX.
    ///
    /// `result_offset` is the 1-based position within the table of the
    /// column whose value is returned, when it could be determined.
    LookupTable { result_offset: Option<u32> },
    /// The value VLOOKUP searches for
    LookupValue,
}

/// One reference occurrence in a formula
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// Sheet qualifier as written; `None` means the formula's own sheet
    pub sheet: Option<String>,
    pub kind: ReferenceKind,
    /// Every column covered, left to right; never empty
    pub columns: Vec<ColumnId>,
    pub role: LookupRole,
    /// First 1-based row number written, if any
    pub row: Option<u32>,
    /// Byte range of the whole reference, sheet qualifier included
    pub span: Range<usize>,
    /// Byte range of the address part, after any sheet qualifier
    pub address_span: Range<usize>,
}

impl Reference {
    /// The sheet this reference points at, given the formula's own sheet
    pub fn target_sheet<'a>(&'a self, current_sheet: &'a str) -> &'a str {
        self.sheet.as_deref().unwrap_or(current_sheet)
    }

    /// First column covered
    pub fn first_column(&self) -> ColumnId {
        self.columns[0]
    }

    /// Last column covered
    pub fn last_column(&self) -> ColumnId {
        self.columns[self.columns.len() - 1]
    }

    /// The column a lookup actually returns, when this is a lookup table with
    /// a known offset that falls inside the table
    pub fn result_column(&self) -> Option<ColumnId> {
        match self.role {
            LookupRole::LookupTable {
                result_offset: Some(offset),
            } if offset >= 1 => self.columns.get(offset as usize - 1).copied(),
            _ => None,
        }
    }

    /// Whether this is a lookup table argument
    pub fn is_lookup_table(&self) -> bool {
        matches!(self.role, LookupRole::LookupTable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(offset: Option<u32>) -> Reference {
        let a = ColumnId::parse("A").unwrap();
        let c = ColumnId::parse("C").unwrap();
        Reference {
            sheet: Some("Rates".into()),
            kind: ReferenceKind::ColumnRange,
            columns: a.span_to(c).unwrap(),
            role: LookupRole::LookupTable {
                result_offset: offset,
            },
            row: None,
            span: 0..9,
            address_span: 6..9,
        }
    }

    #[test]
    fn test_result_column() {
        assert_eq!(table(Some(2)).result_column().unwrap().letters(), "B");
        assert_eq!(table(Some(3)).result_column().unwrap().letters(), "C");
        assert!(table(Some(4)).result_column().is_none());
        assert!(table(Some(0)).result_column().is_none());
        assert!(table(None).result_column().is_none());
    }

    #[test]
    fn test_target_sheet() {
        let mut r = table(None);
        assert_eq!(r.target_sheet("Main"), "Rates");
        r.sheet = None;
        assert_eq!(r.target_sheet("Main"), "Main");
        assert_eq!(r.first_column().letters(), "A");
        assert_eq!(r.last_column().letters(), "C");
    }
}
