use std::collections::BTreeSet;

use serde::Deserialize;

use super::model::{CellValue, Dataset};
use super::schema::{sort_labels, ColumnKey, RegionMap};

// ---------------------------------------------------------------------------
// ViewTable – what gets rendered and exported
// ---------------------------------------------------------------------------

/// A rectangular, display-ready table: every row has `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ViewTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How price column headers are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    /// `50`
    #[default]
    Label,
    /// `50 (EU)`
    LabelWithRegion,
}

impl PresentationMode {
    pub fn header(self, label: &str, region: &str) -> String {
        match self {
            PresentationMode::Label => label.to_string(),
            PresentationMode::LabelWithRegion => format!("{label} ({region})"),
        }
    }
}

/// Knobs of the view composer.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    /// Preferred order of base columns; absent ones are skipped.
    pub base_columns: Vec<String>,
    pub separator: char,
    pub presentation: PresentationMode,
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// (source column in the dataset, header shown to the user)
type ColumnPlan = Vec<(String, String)>;

fn plan_columns(dataset: &Dataset, regions: &RegionMap, region: Option<&str>, options: &ViewOptions) -> ColumnPlan {
    let mut plan: ColumnPlan = options
        .base_columns
        .iter()
        .filter(|c| dataset.has_column(c))
        .map(|c| (c.clone(), c.clone()))
        .collect();

    let Some(region) = region.filter(|r| !r.is_empty()) else {
        return plan;
    };

    // Re-sort here so header order never depends on how the map was built.
    let mut labels = regions.labels(region).to_vec();
    sort_labels(&mut labels);

    for label in labels {
        let key = ColumnKey {
            label,
            region: region.to_string(),
        };
        let source = key.column_name(options.separator);
        if !dataset.has_column(&source) {
            log::warn!("Region map lists '{source}' but the catalog has no such column");
            continue;
        }
        let mut header = options.presentation.header(&key.label, &key.region);
        // A bare label must not shadow a base column header (`REF_EU` → `REF`).
        if plan.iter().any(|(_, shown)| *shown == header) {
            header = PresentationMode::LabelWithRegion.header(&key.label, &key.region);
        }
        plan.push((source, header));
    }
    plan
}

// ---------------------------------------------------------------------------
// Column visibility
// ---------------------------------------------------------------------------

/// How many choices start visible when none of the preferred columns exist.
pub const FALLBACK_VISIBLE_COLUMNS: usize = 8;

/// Columns the user may show or hide: the preferred ones present in the
/// catalog first, then every other non-price column in header order.
pub fn base_column_choices(
    dataset: &Dataset,
    regions: &RegionMap,
    separator: char,
    preferred: &[String],
) -> Vec<String> {
    let mut choices: Vec<String> = Vec::new();
    for column in preferred.iter().filter(|c| dataset.has_column(c)) {
        if !choices.contains(column) {
            choices.push(column.clone());
        }
    }
    for column in &dataset.columns {
        let is_price = ColumnKey::parse(column, separator)
            .is_some_and(|key| regions.labels(&key.region).contains(&key.label));
        if !is_price && !choices.contains(column) {
            choices.push(column.clone());
        }
    }
    choices
}

/// Preferred columns among `choices`, or the first few choices if none are.
pub fn default_visible_columns(choices: &[String], preferred: &[String]) -> BTreeSet<String> {
    let present: BTreeSet<String> = choices
        .iter()
        .filter(|c| preferred.contains(*c))
        .cloned()
        .collect();
    if !present.is_empty() {
        return present;
    }
    choices.iter().take(FALLBACK_VISIBLE_COLUMNS).cloned().collect()
}

/// Build the table for the given filtered rows and selected region.
///
/// An unknown, empty or missing region yields the base columns only.
pub fn compose(
    dataset: &Dataset,
    rows: &[usize],
    regions: &RegionMap,
    region: Option<&str>,
    options: &ViewOptions,
) -> ViewTable {
    let plan = plan_columns(dataset, regions, region, options);

    let rows = rows
        .iter()
        .filter_map(|&i| dataset.records.get(i))
        .map(|record| {
            plan.iter()
                .map(|(source, _)| {
                    record
                        .field(&dataset.roles, source)
                        .cloned()
                        .unwrap_or(CellValue::Null)
                })
                .collect()
        })
        .collect();

    ViewTable {
        columns: plan.into_iter().map(|(_, header)| header).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnRoles;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn options(presentation: PresentationMode) -> ViewOptions {
        ViewOptions {
            base_columns: ["REF", "Category", "Product Name", "Description"]
                .map(String::from)
                .to_vec(),
            separator: '_',
            presentation,
        }
    }

    fn catalog() -> Dataset {
        let headers = ["100_EU", "REF", "Product Name", "50_EU", "Tier1_US"]
            .map(String::from)
            .to_vec();
        let rows = vec![
            vec![
                CellValue::Float(0.9),
                text("A1"),
                text("Pen"),
                CellValue::Float(1.1),
                CellValue::Integer(2),
            ],
            vec![
                CellValue::Null,
                text("A2"),
                text("Mug"),
                CellValue::Float(4.5),
                CellValue::Integer(6),
            ],
        ];
        Dataset::from_rows(headers, rows, ColumnRoles::default())
    }

    #[test]
    fn price_columns_are_sorted_at_composition() {
        let ds = catalog();
        let mut regions = RegionMap::default();
        regions.insert("EU", vec!["100".to_string(), "50".to_string()]);

        let view = compose(&ds, &[0, 1], &regions, Some("EU"), &options(PresentationMode::Label));

        assert_eq!(view.columns, vec!["REF", "Product Name", "50", "100"]);
        assert_eq!(
            view.rows[0],
            vec![text("A1"), text("Pen"), CellValue::Float(1.1), CellValue::Float(0.9)]
        );
        assert_eq!(view.rows[1][3], CellValue::Null);
    }

    #[test]
    fn label_with_region_presentation() {
        let ds = catalog();
        let mut regions = RegionMap::default();
        regions.insert("US", vec!["Tier1".to_string()]);

        let view = compose(&ds, &[1], &regions, Some("US"), &options(PresentationMode::LabelWithRegion));
        assert_eq!(view.columns, vec!["REF", "Product Name", "Tier1 (US)"]);
        assert_eq!(view.rows, vec![vec![text("A2"), text("Mug"), CellValue::Integer(6)]]);
    }

    #[test]
    fn unknown_or_missing_region_gives_base_columns_only() {
        let ds = catalog();
        let regions = RegionMap::default();

        for region in [Some("UK"), Some(""), None] {
            let view = compose(&ds, &[0], &regions, region, &options(PresentationMode::Label));
            assert_eq!(view.columns, vec!["REF", "Product Name"]);
            assert_eq!(view.rows.len(), 1);
        }
    }

    #[test]
    fn labels_without_a_backing_column_are_skipped() {
        let ds = catalog();
        let mut regions = RegionMap::default();
        regions.insert("EU", vec!["50".to_string(), "250".to_string()]);

        let view = compose(&ds, &[0], &regions, Some("EU"), &options(PresentationMode::Label));
        assert_eq!(view.columns, vec!["REF", "Product Name", "50"]);
    }

    #[test]
    fn bare_label_colliding_with_a_base_column_keeps_its_region() {
        let headers = ["REF", "REF_EU", "50_EU"].map(String::from).to_vec();
        let rows = vec![vec![text("A1"), text("EU-A1"), CellValue::Float(1.5)]];
        let ds = Dataset::from_rows(headers, rows, ColumnRoles::default());
        let mut regions = RegionMap::default();
        regions.insert("EU", vec!["50".to_string(), "REF".to_string()]);

        let view = compose(&ds, &[0], &regions, Some("EU"), &options(PresentationMode::Label));
        assert_eq!(view.columns, vec!["REF", "50", "REF (EU)"]);
        assert_eq!(view.rows[0], vec![text("A1"), CellValue::Float(1.5), text("EU-A1")]);
    }

    #[test]
    fn column_choices_exclude_price_columns() {
        let ds = catalog();
        let mut regions = RegionMap::default();
        regions.insert("EU", vec!["50".to_string(), "100".to_string()]);
        regions.insert("US", vec!["Tier1".to_string()]);
        let preferred = vec!["Product Name".to_string(), "Category".to_string()];

        let choices = base_column_choices(&ds, &regions, '_', &preferred);
        assert_eq!(choices, vec!["Product Name", "REF"]);

        let visible = default_visible_columns(&choices, &preferred);
        assert_eq!(visible, BTreeSet::from(["Product Name".to_string()]));
    }

    #[test]
    fn without_preferred_columns_the_first_few_are_visible() {
        let headers: Vec<String> = (0..10).map(|i| format!("Col{i}")).collect();
        let ds = Dataset::from_rows(headers.clone(), Vec::new(), ColumnRoles::default());
        let preferred = vec!["REF".to_string()];

        let choices = base_column_choices(&ds, &RegionMap::default(), '_', &preferred);
        assert_eq!(choices, headers);

        let visible = default_visible_columns(&choices, &preferred);
        assert_eq!(visible.len(), FALLBACK_VISIBLE_COLUMNS);
        assert!(visible.contains("Col0") && !visible.contains("Col9"));
    }

    #[test]
    fn base_columns_follow_preferred_order_not_header_order() {
        let ds = catalog();
        let opts = ViewOptions {
            base_columns: vec!["Product Name".to_string(), "REF".to_string()],
            ..options(PresentationMode::Label)
        };
        let view = compose(&ds, &[], &RegionMap::default(), None, &opts);
        assert_eq!(view.columns, vec!["Product Name", "REF"]);
        assert!(view.is_empty());
    }
}
