//! CSV reader

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use sheet_trace_core::{CellValue, Error as CoreError, Workbook, Worksheet, FORMULA_MARKER, MAX_COLS, MAX_ROWS};
use tracing::{debug, warn};

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a one-sheet workbook named after the file stem
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Workbook> {
        let path = path.as_ref();
        let mut workbook = Workbook::empty();
        workbook.add_existing_worksheet(Self::read_sheet_file(path, options)?)?;
        Ok(workbook)
    }

    /// Read every `.csv` file in a directory into one workbook.
    ///
    /// Sheets are ordered by file name. Sub-directories and other files are
    /// ignored.
    pub fn read_dir<P: AsRef<Path>>(dir: P, options: &CsvReadOptions) -> CsvResult<Workbook> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
            if path.is_file() && is_csv {
                paths.push(path);
            }
        }
        paths.sort();

        let mut workbook = Workbook::empty();
        for path in &paths {
            workbook.add_existing_worksheet(Self::read_sheet_file(path, options)?)?;
        }
        if workbook.is_empty() {
            warn!(dir = %dir.display(), "no .csv files found");
        }
        Ok(workbook)
    }

    /// Read CSV from a reader into a worksheet with the given name
    pub fn read<R: Read>(reader: R, sheet_name: &str, options: &CsvReadOptions) -> CsvResult<Worksheet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut worksheet = Worksheet::new(sheet_name);

        for (row_idx, result) in csv_reader.records().enumerate() {
            let record = result?;
            let row = u32::try_from(row_idx).unwrap_or(u32::MAX);
            if row >= MAX_ROWS {
                return Err(CoreError::RowOutOfBounds(row, MAX_ROWS - 1).into());
            }

            for (col, field) in record.iter().enumerate() {
                let col = u16::try_from(col)
                    .map_err(|_| CoreError::ColumnOutOfBounds(col as u32, MAX_COLS - 1))?;
                let value = if options.auto_detect_types {
                    Self::detect_type(field)
                } else {
                    CellValue::string(field)
                };

                worksheet.set_cell_value_at(row, col, value)?;
            }
        }

        debug!(
            sheet = sheet_name,
            cells = worksheet.cell_count(),
            columns = worksheet.column_count(),
            "read csv sheet"
        );
        Ok(worksheet)
    }

    fn read_sheet_file(path: &Path, options: &CsvReadOptions) -> CsvResult<Worksheet> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| CsvError::InvalidPath(path.to_path_buf()))?;
        let file = File::open(path)?;
        Self::read(file, name, options)
    }

    /// Detect the type of a field value
    fn detect_type(field: &str) -> CellValue {
        // Formulas are kept exactly as written
        if field.starts_with(FORMULA_MARKER) {
            return CellValue::string(field);
        }

        let field = field.trim();

        if field.is_empty() {
            return CellValue::Empty;
        }

        if field.eq_ignore_ascii_case("true") {
            return CellValue::Boolean(true);
        }
        if field.eq_ignore_ascii_case("false") {
            return CellValue::Boolean(false);
        }

        // "nan" and "inf" parse as f64 but are text in a sheet
        match field.parse::<f64>() {
            Ok(n) if n.is_finite() => return CellValue::Number(n),
            _ => {}
        }

        if field.starts_with('#') {
            return CellValue::Error(field.to_string());
        }

        CellValue::string(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_read_keeps_every_row() {
        let data = "Qty,Price,Total\n3,2.5,=A2*B2\n";
        let ws = CsvReader::read(data.as_bytes(), "Orders", &CsvReadOptions::default()).unwrap();

        assert_eq!(ws.name(), "Orders");
        assert_eq!(ws.get_value("A1").unwrap(), CellValue::string("Qty"));
        assert_eq!(ws.get_value("A2").unwrap(), CellValue::Number(3.0));
        assert_eq!(ws.get_value("B2").unwrap(), CellValue::Number(2.5));
        assert_eq!(ws.get_value("C2").unwrap(), CellValue::string("=A2*B2"));
        assert!(ws.get_value("C2").unwrap().is_formula());
    }

    #[test]
    fn test_quoted_formula_with_commas() {
        let data = "Code,Rate\nX,\"=VLOOKUP(A2,Rates!A:B,2,FALSE)\"\n";
        let ws = CsvReader::read(data.as_bytes(), "Sheet1", &CsvReadOptions::default()).unwrap();
        assert_eq!(
            ws.get_value("B2").unwrap().formula_text(),
            Some("=VLOOKUP(A2,Rates!A:B,2,FALSE)")
        );
    }

    #[test]
    fn test_detect_type() {
        assert_eq!(CsvReader::detect_type("TRUE"), CellValue::Boolean(true));
        assert_eq!(CsvReader::detect_type("false"), CellValue::Boolean(false));
        assert_eq!(CsvReader::detect_type("1"), CellValue::Number(1.0));
        assert_eq!(CsvReader::detect_type(" 42 "), CellValue::Number(42.0));
        assert_eq!(CsvReader::detect_type("#N/A"), CellValue::Error("#N/A".into()));
        assert_eq!(CsvReader::detect_type("   "), CellValue::Empty);
        assert_eq!(CsvReader::detect_type("abc"), CellValue::string("abc"));
    }

    #[test]
    fn test_non_finite_words_stay_text() {
        for word in ["nan", "NaN", "inf", "-Infinity"] {
            assert_eq!(CsvReader::detect_type(word), CellValue::string(word));
        }
        assert_eq!(CsvReader::detect_type("1e3"), CellValue::Number(1000.0));
    }

    #[test]
    fn test_ragged_rows_and_delimiter() {
        let data = "a;b;c\n1\n";
        let ws = CsvReader::read(data.as_bytes(), "S", &CsvReadOptions::with_delimiter(b';')).unwrap();
        assert_eq!(ws.column_count(), 3);
        assert_eq!(ws.get_value("A2").unwrap(), CellValue::Number(1.0));
    }

    #[test]
    fn test_read_file_names_sheet_after_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Qty,Total").unwrap();
        writeln!(file, "2,=A2*3").unwrap();

        let workbook = CsvReader::read_file(&path, &CsvReadOptions::default()).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["orders"]);
    }

    #[test]
    fn test_read_dir_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b_rates.csv"), "Code,Rate\nX,0.2\n").unwrap();
        fs::write(dir.path().join("a_orders.csv"), "Code,Rate\nX,=VLOOKUP(A2,b_rates!A:B,2,0)\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let workbook = CsvReader::read_dir(dir.path(), &CsvReadOptions::default()).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["a_orders", "b_rates"]);
    }

    #[test]
    fn test_read_missing_file() {
        let err = CsvReader::read_file("/definitely/not/here.csv", &CsvReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, CsvError::Io(_)));
    }
}
