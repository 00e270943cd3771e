use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use serde_json::Value as JsonValue;

use super::model::{CellValue, ColumnRoles, Dataset};
use super::sheets::GoogleSheetsSource;
use crate::error::DataError;

// ---------------------------------------------------------------------------
// Source abstraction
// ---------------------------------------------------------------------------

/// Anything that can produce a catalog. Credentials and transport stay behind
/// this trait.
pub trait DatasetSource {
    fn load(&self) -> Result<Dataset, DataError>;

    /// Human-readable origin used in logs and status messages.
    fn describe(&self) -> String;
}

/// The sources the viewer can be pointed at.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    File(FileSource),
    GoogleSheets(GoogleSheetsSource),
    Sample(ColumnRoles),
}

impl DatasetSource for CatalogSource {
    fn load(&self) -> Result<Dataset, DataError> {
        match self {
            CatalogSource::File(s) => s.load(),
            CatalogSource::GoogleSheets(s) => s.load(),
            CatalogSource::Sample(roles) => Ok(sample_dataset(roles)),
        }
    }

    fn describe(&self) -> String {
        match self {
            CatalogSource::File(s) => s.describe(),
            CatalogSource::GoogleSheets(s) => s.describe(),
            CatalogSource::Sample(_) => "built-in sample".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Local files
// ---------------------------------------------------------------------------

/// A catalog file on disk. Format is picked by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first row is the header
/// * `.csv`  – header row, cell types guessed
/// * `.json` – `[{ "REF": "...", "50_EU": 1.2, ... }, ...]`
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
    /// Worksheet name for spreadsheet files; the first sheet when `None`.
    pub sheet: Option<String>,
    pub roles: ColumnRoles,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, sheet: Option<String>, roles: ColumnRoles) -> Self {
        Self {
            path: path.into(),
            sheet,
            roles,
        }
    }
}

impl DatasetSource for FileSource {
    fn load(&self) -> Result<Dataset, DataError> {
        load_file(&self.path, self.sheet.as_deref(), &self.roles)
            .map_err(|e| DataError::unavailable(self.describe(), format!("{e:#}")))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Load a catalog from a file. Dispatch by extension.
pub fn load_file(path: &Path, sheet: Option<&str>, roles: &ColumnRoles) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(path, sheet, roles),
        "json" => load_json(path, roles),
        "csv" => load_csv(path, roles),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path, sheet: Option<&str>, roles: &ColumnRoles) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    dataset_from_workbook(&mut workbook, sheet, roles)
}

/// Read one worksheet: the named one, or the first.
pub fn dataset_from_workbook<RS>(workbook: &mut Sheets<RS>, sheet: Option<&str>, roles: &ColumnRoles) -> Result<Dataset>
where
    RS: Read + Seek,
{
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .context("workbook has no sheets")?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("reading sheet '{sheet_name}'"))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| cell_to_value(c).to_string()).collect(),
        None => Vec::new(),
    };
    let values: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect();

    Ok(Dataset::from_rows(headers, values, roles.clone()))
}

fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.trim().to_string()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')` or a Sheets
/// `get_all_records` dump). Column order is first-seen key order.
fn load_json(path: &Path, roles: &ColumnRoles) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    dataset_from_json_records(&root, roles)
}

pub fn dataset_from_json_records(root: &JsonValue, roles: &ColumnRoles) -> Result<Dataset> {
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_value).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(Dataset::from_rows(headers, rows, roles.clone()))
}

pub(crate) fn json_to_value(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) if s.is_empty() => CellValue::Null,
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, roles: &ColumnRoles) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(|v| CellValue::guess(v.trim())).collect());
    }

    Ok(Dataset::from_rows(headers, rows, roles.clone()))
}

// ---------------------------------------------------------------------------
// Built-in sample
// ---------------------------------------------------------------------------

/// A small catalog used when the configured source is unavailable.
pub fn sample_dataset(roles: &ColumnRoles) -> Dataset {
    fn t(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }
    fn p(v: f64) -> CellValue {
        CellValue::Float(v)
    }

    let headers = vec![
        roles.reference.clone(),
        roles.category.clone(),
        roles.name.clone(),
        roles.description.clone(),
        "Tags".to_string(),
        "50_EU".to_string(),
        "100_EU".to_string(),
        "250_EU".to_string(),
        "50_UK".to_string(),
        "100_UK".to_string(),
        "Tier1_US".to_string(),
        "Tier2_US".to_string(),
    ];

    let rows = vec![
        vec![t("KP-1001"), t("Pens"), t("Classic Ballpoint"), t("Click pen with blue ink"), t("office writing"),
             p(0.85), p(0.72), p(0.61), p(0.74), p(0.63), p(0.95), p(0.80)],
        vec![t("KP-1002"), t("Pens"), t("Gel Rollerball"), t("Smooth black gel ink"), t("office premium"),
             p(1.40), p(1.22), p(1.05), p(1.21), p(1.06), p(1.55), p(1.30)],
        vec![t("KM-2001"), t("Mugs"), t("Ceramic Mug 11oz"), t("Dishwasher safe white mug"), t("kitchen"),
             p(3.10), p(2.75), p(2.40), p(2.70), p(2.38), p(3.45), p(2.95)],
        vec![t("KM-2002"), t("Mugs"), t("Travel Tumbler"), t("Double wall steel, blue lid"), t("outdoor travel"),
             p(7.90), p(7.10), p(6.35), p(6.85), p(6.15), p(8.60), p(7.70)],
        vec![t("KB-3001"), t("Bags"), t("Cotton Tote"), t("Natural 140gsm cotton"), t("eco"),
             p(2.20), p(1.95), p(1.70), p(1.90), p(1.68), p(2.45), p(2.10)],
        vec![t("KB-3002"), t("Bags"), t("Drawstring Bag"), CellValue::Null, t("eco sport"),
             p(1.60), p(1.38), p(1.19), p(1.35), p(1.17), CellValue::Null, p(1.50)],
    ];

    Dataset::from_rows(headers, rows, roles.clone())
}
