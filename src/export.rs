use std::path::Path;

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, XlsxError};

use crate::data::model::CellValue;
use crate::data::view::ViewTable;
use crate::error::ExportError;

/// Sheet name used for spreadsheet exports.
pub const SHEET_NAME: &str = "Products";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn default_file_name(self) -> &'static str {
        match self {
            ExportFormat::Csv => "Products_View.csv",
            ExportFormat::Xlsx => "Products_View.xlsx",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Xlsx => "Excel",
        }
    }

    pub fn to_bytes(self, table: &ViewTable) -> Result<Vec<u8>, ExportError> {
        match self {
            ExportFormat::Csv => to_csv_bytes(table),
            ExportFormat::Xlsx => to_xlsx_bytes(table),
        }
    }
}

/// UTF-8, comma-delimited, header row first. Nulls become empty fields.
pub fn to_csv_bytes(table: &ViewTable) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))
}

/// Single `Products` sheet with a bold header row. Numbers and booleans keep
/// their type; nulls are left blank.
pub fn to_xlsx_bytes(table: &ViewTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (c, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_num(c)?, name, &header_format)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let r = row_num(r + 1)?;
        for (c, value) in row.iter().enumerate() {
            let c = col_num(c)?;
            match value {
                CellValue::Null => {}
                CellValue::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                CellValue::Integer(_) | CellValue::Float(_) => {
                    let n = value.as_f64().unwrap_or_default();
                    worksheet.write_number(r, c, n)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn row_num(r: usize) -> Result<RowNum, XlsxError> {
    RowNum::try_from(r).map_err(|_| XlsxError::RowColumnLimitError)
}

fn col_num(c: usize) -> Result<ColNum, XlsxError> {
    ColNum::try_from(c).map_err(|_| XlsxError::RowColumnLimitError)
}

/// Serialise `table` and write it to `path`. Returns the byte count.
pub fn write_to_path(table: &ViewTable, format: ExportFormat, path: &Path) -> Result<usize, ExportError> {
    let bytes = format.to_bytes(table)?;
    std::fs::write(path, &bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "Exported {} rows as {} to {} ({} bytes)",
        table.row_count(),
        format.label(),
        path.display(),
        bytes.len()
    );
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use calamine::{open_workbook_auto_from_rs, Data, Reader};

    use super::*;

    fn table() -> ViewTable {
        ViewTable {
            columns: vec!["REF".into(), "Product Name".into(), "50 (EU)".into(), "100 (EU)".into()],
            rows: vec![
                vec![
                    CellValue::Text("A1".into()),
                    CellValue::Text("Pen, blue".into()),
                    CellValue::Float(1.25),
                    CellValue::Integer(1),
                ],
                vec![
                    CellValue::Text("A2".into()),
                    CellValue::Text("Mug \"XL\"".into()),
                    CellValue::Null,
                    CellValue::Float(3.5),
                ],
            ],
        }
    }

    #[test]
    fn csv_round_trip_keeps_headers_and_row_count() {
        let bytes = to_csv_bytes(&table()).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());

        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, table().columns);

        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "Pen, blue");
        assert_eq!(&rows[0][2], "1.25");
        assert_eq!(&rows[1][1], "Mug \"XL\"");
        assert_eq!(&rows[1][2], "");
    }

    #[test]
    fn csv_of_empty_table_is_just_the_header() {
        let empty = ViewTable {
            columns: vec!["REF".into(), "Category".into()],
            rows: Vec::new(),
        };
        let bytes = to_csv_bytes(&empty).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "REF,Category\n");
    }

    #[test]
    fn xlsx_round_trip_keeps_headers_and_types() {
        let bytes = to_xlsx_bytes(&table()).unwrap();
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);

        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let mut rows = range.rows();
        let header: Vec<String> = rows.next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(header, table().columns);

        let first = rows.next().unwrap();
        assert_eq!(first[2], Data::Float(1.25));
        assert_eq!(first[3], Data::Float(1.0));
        let second = rows.next().unwrap();
        assert_eq!(second[2], Data::Empty);
        assert!(rows.next().is_none());
    }

    #[test]
    fn write_to_path_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ExportFormat::Csv.default_file_name());
        let written = write_to_path(&table(), ExportFormat::Csv, &path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, written);
    }

    #[test]
    fn write_to_missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.xlsx");
        let err = write_to_path(&table(), ExportFormat::Xlsx, &path).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
