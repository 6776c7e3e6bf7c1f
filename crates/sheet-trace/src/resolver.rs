//! Column Resolver
//!
//! Turns a `(sheet, column)` pair into the column's header label and the
//! content of its formula row. Each sheet is scanned once per [`RowConfig`]
//! and kept in a read-through cache that concurrent traces may share.

use std::sync::{Arc, RwLock};

use ahash::AHashMap;
use serde::Serialize;
use sheet_trace_core::{ColumnId, Scalar, SheetSource};
use tracing::debug;

use crate::error::{TraceError, TraceResult};

/// Which rows hold the header labels and the representative formulas.
///
/// Rows are 1-based, as a spreadsheet user counts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RowConfig {
    header_row: u32,
    formula_row: u32,
}

impl RowConfig {
    /// Validate and build a row configuration.
    ///
    /// Both rows must be positive and different.
    pub fn new(header_row: u32, formula_row: u32) -> TraceResult<Self> {
        if header_row == 0 || formula_row == 0 {
            return Err(TraceError::Config(format!(
                "rows are 1-based; got header row {} and formula row {}",
                header_row, formula_row
            )));
        }
        if header_row == formula_row {
            return Err(TraceError::Config(format!(
                "header row and formula row must differ (both are {})",
                header_row
            )));
        }
        Ok(Self {
            header_row,
            formula_row,
        })
    }

    /// 1-based header row
    pub fn header_row(&self) -> u32 {
        self.header_row
    }

    /// 1-based formula row
    pub fn formula_row(&self) -> u32 {
        self.formula_row
    }
}

impl Default for RowConfig {
    fn default() -> Self {
        Self {
            header_row: 1,
            formula_row: 2,
        }
    }
}

/// What a column's formula-row cell holds
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ColumnContent {
    /// Formula text, leading `=` included
    Formula(String),
    /// A plain value
    StaticValue(Scalar),
    Empty,
}

/// A column's header and formula-row content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    /// Header text, or the column letters when the header cell is blank
    pub header: String,
    /// Whether `header` came from the header row
    #[serde(skip)]
    pub labelled: bool,
    pub content: ColumnContent,
}

impl ColumnInfo {
    /// Info for a column with neither header nor content
    pub fn blank(column: ColumnId) -> Self {
        Self {
            header: column.letters(),
            labelled: false,
            content: ColumnContent::Empty,
        }
    }

    /// The formula text, if the column holds one
    pub fn formula(&self) -> Option<&str> {
        match &self.content {
            ColumnContent::Formula(text) => Some(text),
            _ => None,
        }
    }
}

/// Every used column of one sheet under one row configuration
#[derive(Debug, Default)]
pub struct SheetColumns {
    columns: Vec<ColumnInfo>,
}

impl SheetColumns {
    fn scan<S: SheetSource + ?Sized>(source: &S, sheet: &str, width: u16, rows: RowConfig) -> Self {
        let header_idx = rows.header_row - 1;
        let formula_idx = rows.formula_row - 1;

        let columns = (0..width)
            .filter_map(|c| ColumnId::new(c).ok())
            .map(|column| {
                let header_cell = source.cell_content(sheet, header_idx, column);
                let label = header_cell.to_string().trim().to_string();
                let labelled = !label.is_empty();

                let cell = source.cell_content(sheet, formula_idx, column);
                let content = match (cell.formula_text(), cell.as_scalar()) {
                    (Some(text), _) => ColumnContent::Formula(text.to_string()),
                    (None, Some(value)) => ColumnContent::StaticValue(value),
                    (None, None) => ColumnContent::Empty,
                };

                ColumnInfo {
                    header: if labelled { label } else { column.letters() },
                    labelled,
                    content,
                }
            })
            .collect();

        Self { columns }
    }

    /// Info for `column`; columns past the used range are blank
    pub fn get(&self, column: ColumnId) -> ColumnInfo {
        self.columns
            .get(column.index() as usize)
            .cloned()
            .unwrap_or_else(|| ColumnInfo::blank(column))
    }

    /// Used columns, left to right
    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &ColumnInfo)> {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(i, info)| Some((ColumnId::new(i as u16).ok()?, info)))
    }

    /// Number of used columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the sheet has no used columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

type CacheKey = (String, RowConfig);

/// Resolves columns against a [`SheetSource`], caching one scan per
/// `(sheet, RowConfig)`.
pub struct ColumnResolver<'a, S: SheetSource + ?Sized> {
    source: &'a S,
    cache: RwLock<AHashMap<CacheKey, Arc<SheetColumns>>>,
}

impl<'a, S: SheetSource + ?Sized> ColumnResolver<'a, S> {
    /// Create a resolver over `source`
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            cache: RwLock::new(AHashMap::new()),
        }
    }

    /// The underlying source
    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Whether `sheet` exists
    pub fn has_sheet(&self, sheet: &str) -> bool {
        self.source.has_sheet(sheet)
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.source.sheet_names()
    }

    /// All used columns of `sheet`, scanned once per row configuration
    pub fn sheet_columns(&self, sheet: &str, rows: RowConfig) -> TraceResult<Arc<SheetColumns>> {
        let key = (sheet.to_string(), rows);

        {
            let cache = match self.cache.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(columns) = cache.get(&key) {
                return Ok(Arc::clone(columns));
            }
        }

        let width = self
            .source
            .column_count(sheet)
            .ok_or_else(|| TraceError::SheetNotFound(sheet.to_string()))?;

        // Scanned outside the lock; a racing scan of the same key yields the same data
        let scanned = Arc::new(SheetColumns::scan(self.source, sheet, width, rows));
        debug!(
            sheet,
            header_row = rows.header_row,
            formula_row = rows.formula_row,
            columns = scanned.len(),
            "scanned sheet columns"
        );

        let mut cache = match self.cache.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(Arc::clone(cache.entry(key).or_insert(scanned)))
    }

    /// Header and formula-row content of one column
    pub fn resolve(&self, sheet: &str, column: ColumnId, rows: RowConfig) -> TraceResult<ColumnInfo> {
        Ok(self.sheet_columns(sheet, rows)?.get(column))
    }

    /// Header text, falling back to the column letters when the header cell is blank
    pub fn header(&self, sheet: &str, column: ColumnId, rows: RowConfig) -> TraceResult<String> {
        Ok(self.resolve(sheet, column, rows)?.header)
    }

    /// Header text only when the header cell is filled in
    pub fn header_label(
        &self,
        sheet: &str,
        column: ColumnId,
        rows: RowConfig,
    ) -> TraceResult<Option<String>> {
        let info = self.resolve(sheet, column, rows)?;
        Ok(info.labelled.then_some(info.header))
    }

    /// Locate a column by its header text.
    ///
    /// Matching ignores surrounding whitespace. An exact match wins over a
    /// case-insensitive one; among equals the left-most column wins.
    pub fn find_column(&self, sheet: &str, header: &str, rows: RowConfig) -> TraceResult<ColumnId> {
        let columns = self.sheet_columns(sheet, rows)?;
        let wanted = header.trim();

        let labelled = || columns.iter().filter(|(_, info)| info.labelled);
        let found = labelled()
            .find(|(_, info)| info.header == wanted)
            .or_else(|| labelled().find(|(_, info)| info.header.eq_ignore_ascii_case(wanted)))
            .map(|(column, _)| column)
            .ok_or_else(|| TraceError::ColumnNotFound {
                sheet: sheet.to_string(),
                header: header.to_string(),
            });
        found
    }

    #[cfg(test)]
    fn cached_entries(&self) -> usize {
        match self.cache.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
