use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Deserialize;

use crate::error::DataError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the catalog
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as it comes out of a spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Guess the type of a raw text cell (CSV, formatted sheet values).
    pub fn guess(s: &str) -> Self {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() {
                return CellValue::Float(f);
            }
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::Text(s.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnRoles – which header plays which base role
// ---------------------------------------------------------------------------

/// Header names of the four descriptive columns every catalog is expected to carry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnRoles {
    pub reference: String,
    pub category: String,
    pub name: String,
    pub description: String,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            reference: "REF".to_string(),
            category: "Category".to_string(),
            name: "Product Name".to_string(),
            description: "Description".to_string(),
        }
    }
}

impl ColumnRoles {
    /// Whether `column` is claimed by one of the base roles.
    pub fn claims(&self, column: &str) -> bool {
        self.all().contains(&column)
    }

    pub fn all(&self) -> [&str; 4] {
        [
            self.reference.as_str(),
            self.category.as_str(),
            self.name.as_str(),
            self.description.as_str(),
        ]
    }
}

// ---------------------------------------------------------------------------
// ProductRecord – one row of the catalog
// ---------------------------------------------------------------------------

/// A single catalog row: typed base fields plus everything else in `extra`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub reference: CellValue,
    pub category: CellValue,
    pub name: CellValue,
    pub description: CellValue,
    /// Price columns, tags and any other non-base column: column_name → value.
    pub extra: BTreeMap<String, CellValue>,
}

impl ProductRecord {
    /// Build a record from `(column, value)` pairs, routing base columns by `roles`.
    pub fn from_cells<I>(cells: I, roles: &ColumnRoles) -> Self
    where
        I: IntoIterator<Item = (String, CellValue)>,
    {
        let mut record = ProductRecord {
            reference: CellValue::Null,
            category: CellValue::Null,
            name: CellValue::Null,
            description: CellValue::Null,
            extra: BTreeMap::new(),
        };
        for (column, value) in cells {
            if column == roles.reference {
                record.reference = value;
            } else if column == roles.category {
                record.category = value;
            } else if column == roles.name {
                record.name = value;
            } else if column == roles.description {
                record.description = value;
            } else {
                record.extra.insert(column, value);
            }
        }
        record
    }

    /// Look up a column by header name.
    pub fn field(&self, roles: &ColumnRoles, column: &str) -> Option<&CellValue> {
        if column == roles.reference {
            Some(&self.reference)
        } else if column == roles.category {
            Some(&self.category)
        } else if column == roles.name {
            Some(&self.name)
        } else if column == roles.description {
            Some(&self.description)
        } else {
            self.extra.get(column)
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded catalog
// ---------------------------------------------------------------------------

/// The full parsed catalog. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Column names in header order.
    pub columns: Vec<String>,
    pub records: Vec<ProductRecord>,
    pub roles: ColumnRoles,
}

impl Dataset {
    /// Build a dataset from a header row and value rows.
    ///
    /// Blank and repeated headers are dropped (first occurrence wins), rows
    /// shorter than the header are padded with nulls and rows where every
    /// cell is null are skipped.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<CellValue>>, roles: ColumnRoles) -> Self {
        let mut seen = BTreeSet::new();
        let kept: Vec<(usize, String)> = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| (i, h.trim().to_string()))
            .filter(|(_, h)| !h.is_empty() && seen.insert(h.clone()))
            .collect();

        let records = rows
            .into_iter()
            .filter(|row| row.iter().any(|v| !v.is_null()))
            .map(|row| {
                let cells = kept.iter().map(|(idx, name)| {
                    let value = row.get(*idx).cloned().unwrap_or(CellValue::Null);
                    (name.clone(), value)
                });
                ProductRecord::from_cells(cells, &roles)
            })
            .collect();

        Dataset {
            columns: kept.into_iter().map(|(_, h)| h).collect(),
            records,
            roles,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Value of `column` in row `row`, `None` when the column doesn't exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        if !self.has_column(column) {
            return None;
        }
        self.records.get(row)?.field(&self.roles, column)
    }

    /// Distinct category values (string form), sorted. Empty when the
    /// category column is missing.
    pub fn categories(&self) -> BTreeSet<String> {
        if !self.has_column(&self.roles.category) {
            return BTreeSet::new();
        }
        self.records
            .iter()
            .map(|r| r.category.to_string())
            .collect()
    }

    /// One `SchemaMismatch` per base role whose column is absent.
    pub fn schema_warnings(&self) -> Vec<DataError> {
        self.roles
            .all()
            .into_iter()
            .filter(|c| !self.has_column(c))
            .map(|c| DataError::SchemaMismatch {
                column: c.to_string(),
            })
            .collect()
    }
}
