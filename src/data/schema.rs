use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::model::ColumnRoles;

// ---------------------------------------------------------------------------
// ColumnKey – "label<sep>region" price column names
// ---------------------------------------------------------------------------

/// A price column name split into its tier label and region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnKey {
    pub label: String,
    pub region: String,
}

impl ColumnKey {
    /// Split `column` on the first `separator`. Returns `None` for base columns:
    /// no separator, or an empty label/region on either side of it.
    pub fn parse(column: &str, separator: char) -> Option<Self> {
        let (label, region) = column.split_once(separator)?;
        if label.is_empty() || region.is_empty() {
            return None;
        }
        Some(ColumnKey {
            label: label.to_string(),
            region: region.to_string(),
        })
    }

    /// The dataset column this key was parsed from.
    pub fn column_name(&self, separator: char) -> String {
        format!("{}{separator}{}", self.label, self.region)
    }
}

// ---------------------------------------------------------------------------
// Label ordering
// ---------------------------------------------------------------------------

/// A label is numeric when it is a non-empty run of ASCII digits.
pub fn is_numeric_label(label: &str) -> bool {
    !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit())
}

/// Numeric labels first in ascending value, then the rest lexicographically.
///
/// Digit strings are compared by magnitude without parsing so arbitrarily long
/// quantities never overflow; equal magnitudes ("050" vs "50") fall back to
/// the raw string.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (is_numeric_label(a), is_numeric_label(b)) {
        (true, true) => {
            let ta = a.trim_start_matches('0');
            let tb = b.trim_start_matches('0');
            ta.len()
                .cmp(&tb.len())
                .then_with(|| ta.cmp(tb))
                .then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

pub fn sort_labels(labels: &mut [String]) {
    labels.sort_by(|a, b| compare_labels(a, b));
}

// ---------------------------------------------------------------------------
// RegionMap
// ---------------------------------------------------------------------------

/// Region → ordered tier labels that have a price column in the dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionMap {
    regions: BTreeMap<String, Vec<String>>,
}

impl RegionMap {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Region names, sorted.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Labels for `region` in map order, or an empty slice for unknown regions.
    pub fn labels(&self, region: &str) -> &[String] {
        self.regions.get(region).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_region(&self) -> Option<&str> {
        self.regions().next()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.regions
            .iter()
            .map(|(r, labels)| (r.as_str(), labels.as_slice()))
    }

    /// Insert `labels` for `region` verbatim, without sorting.
    #[cfg(test)]
    pub fn insert(&mut self, region: impl Into<String>, labels: Vec<String>) {
        self.regions.insert(region.into(), labels);
    }
}

/// Derive the region map from the header alone.
///
/// Columns claimed by a base role or listed in `base_columns` are never
/// treated as price columns, even when their name contains the separator.
pub fn detect_regions(
    columns: &[String],
    separator: char,
    roles: &ColumnRoles,
    base_columns: &[String],
) -> RegionMap {
    let mut regions: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for column in columns {
        if roles.claims(column) || base_columns.contains(column) {
            continue;
        }
        let Some(key) = ColumnKey::parse(column, separator) else {
            continue;
        };
        let labels = regions.entry(key.region).or_default();
        if !labels.contains(&key.label) {
            labels.push(key.label);
        }
    }

    for labels in regions.values_mut() {
        sort_labels(labels);
    }

    log::debug!("Detected {} pricing regions", regions.len());
    RegionMap { regions }
}
