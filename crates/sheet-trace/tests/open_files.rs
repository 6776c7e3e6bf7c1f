//! Tests for opening workbooks from disk and tracing them

use std::fs;
use std::io::Write;

use pretty_assertions::assert_eq;
use sheet_trace::prelude::*;

fn col(s: &str) -> ColumnId {
    ColumnId::parse(s).unwrap()
}

/// Write a minimal XLSX package with one sheet
fn write_xlsx(path: &std::path::Path, sheet_name: &str, sheet_data: &str, shared: &str) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#)
        .unwrap();

    zip.start_file("xl/workbook.xml", options).unwrap();
    write!(
        zip,
        r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        sheet_name
    )
    .unwrap();

    zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
    zip.write_all(br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#)
        .unwrap();

    zip.start_file("xl/sharedStrings.xml", options).unwrap();
    write!(
        zip,
        r#"<?xml version="1.0"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{}</sst>"#,
        shared
    )
    .unwrap();

    zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
    write!(
        zip,
        r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        sheet_data
    )
    .unwrap();

    zip.finish().unwrap();
}

#[test]
fn test_open_xlsx_and_trace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.xlsx");
    write_xlsx(
        &path,
        "Orders",
        r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row><row r="2"><c r="A2"><v>3</v></c><c r="B2"><v>2.5</v></c><c r="C2"><f>A2*B2</f><v>7.5</v></c></row>"#,
        "<si><t>Qty</t></si><si><t>Price</t></si><si><t>Total</t></si>",
    );

    let workbook = Workbook::open(&path).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Orders"]);

    let resolver = ColumnResolver::new(&workbook);
    let tree = TreeBuilder::new(&resolver, TraceOptions::default())
        .build("Orders", ColumnSelector::header("Total"))
        .unwrap();

    assert_eq!(tree.column, col("C"));
    assert_eq!(tree.formula(), Some("=A2*B2"));
    assert_eq!(tree.readable_formula.as_deref(), Some("=Qty*Price"));
    let headers: Vec<&str> = tree.children.iter().map(|c| c.header()).collect();
    assert_eq!(headers, vec!["Qty", "Price"]);
}

#[test]
fn test_open_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.csv");
    fs::write(&path, "Qty,Price,Total\n3,2.5,=A2*B2\n").unwrap();

    let workbook = Workbook::open(&path).unwrap();
    let resolver = ColumnResolver::new(&workbook);
    let tree = TreeBuilder::new(&resolver, TraceOptions::default())
        .build("orders", col("C"))
        .unwrap();

    assert_eq!(render_text(&tree).lines().count(), 3);
    assert_eq!(
        tree.children[1].info.content,
        ColumnContent::StaticValue(Scalar::Number(2.5))
    );
}

#[test]
fn test_open_csv_directory_across_sheets() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("orders.csv"),
        "Code,Rate\nX,\"=VLOOKUP(A2,rates!A:B,2,FALSE)\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("rates.csv"), "Code,Rate\nX,0.2\n").unwrap();

    let workbook = Workbook::open(dir.path()).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["orders", "rates"]);

    let resolver = ColumnResolver::new(&workbook);
    let tree = TreeBuilder::new(&resolver, TraceOptions::default())
        .build("orders", col("B"))
        .unwrap();

    let edges: Vec<(String, Option<Edge>)> = tree
        .children
        .iter()
        .map(|c| (format!("{}!{}", c.sheet, c.column), c.edge))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("orders!A".to_string(), Some(Edge::LookupValue)),
            ("rates!A".to_string(), Some(Edge::LookupTable)),
            ("rates!B".to_string(), Some(Edge::LookupTable)),
            ("rates!B".to_string(), Some(Edge::LookupResult)),
        ]
    );
}

#[test]
fn test_open_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "hello").unwrap();

    let err = Workbook::open(&path).unwrap_err();
    assert!(matches!(err, TraceError::UnsupportedFormat(_)));
}

#[test]
fn test_open_missing_file() {
    let err = Workbook::open("/definitely/not/here.xlsx").unwrap_err();
    assert!(matches!(err, TraceError::Xlsx(_)));
}
