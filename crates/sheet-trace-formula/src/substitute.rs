//! Readable formula substitution
//!
//! Rewrites each reference span found by [`scan`](crate::scan) with the header
//! text of the column(s) it names, leaving everything else byte-for-byte
//! intact. Function names, string literals and headers that happen to contain
//! column letters are never touched.

use sheet_trace_core::ColumnId;

use crate::extract::scan;
use crate::reference::{Reference, ReferenceKind};

/// Replace reference spans in `formula` with header labels.
///
/// `header_lookup(sheet, column)` returns the label for a column, or `None`
/// when it has none; references with any unlabelled column keep their
/// original text. Sheet qualifiers are kept as written.
///
/// # Example
/// ```
/// use sheet_trace_formula::render;
///
/// let readable = render("=SUM(B2:C2)*RATE", "Sheet1", |_, col| match col.letters().as_str() {
///     "B" => Some("Net".to_string()),
///     "C" => Some("Tax".to_string()),
///     _ => None,
/// });
/// assert_eq!(readable, "=SUM(Net:Tax)*RATE");
/// ```
pub fn render<F>(formula: &str, current_sheet: &str, mut header_lookup: F) -> String
where
    F: FnMut(&str, ColumnId) -> Option<String>,
{
    let mut out = String::with_capacity(formula.len());
    let mut copied = 0;

    for reference in scan(formula) {
        let Some(label) = label_for(&reference, current_sheet, &mut header_lookup) else {
            continue;
        };
        out.push_str(&formula[copied..reference.address_span.start]);
        out.push_str(&label);
        copied = reference.address_span.end;
    }

    out.push_str(&formula[copied..]);
    out
}

fn label_for<F>(reference: &Reference, current_sheet: &str, header_lookup: &mut F) -> Option<String>
where
    F: FnMut(&str, ColumnId) -> Option<String>,
{
    let sheet = reference.target_sheet(current_sheet);
    let first = header_lookup(sheet, reference.first_column())?;

    match reference.kind {
        ReferenceKind::Cell => Some(first),
        ReferenceKind::ColumnRange | ReferenceKind::CellRange => {
            if reference.columns.len() == 1 {
                return Some(first);
            }
            let last = header_lookup(sheet, reference.last_column())?;
            Some(format!("{}:{}", first, last))
        }
    }
}
