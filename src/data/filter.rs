use std::collections::BTreeSet;

use super::model::Dataset;

// ---------------------------------------------------------------------------
// Filter query: selected categories + free-text search
// ---------------------------------------------------------------------------

/// The user's current row filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    /// Allowed category values (string form). Empty means nothing is allowed,
    /// unless the catalog has no category column at all.
    pub categories: BTreeSet<String>,
    /// Raw search text as typed.
    pub search: String,
}

/// Lowercase, whitespace-separated, non-empty search tokens.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .trim()
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Keep rows whose category is in `allowed`.
///
/// * dataset without a category column → the dimension is skipped, whatever
///   `allowed` holds
/// * `allowed` empty → no rows (explicit "nothing selected", not "show all")
pub fn filter_by_category(dataset: &Dataset, rows: &[usize], allowed: &BTreeSet<String>) -> Vec<usize> {
    if !dataset.has_column(&dataset.roles.category) {
        return rows.to_vec();
    }
    if allowed.is_empty() {
        return Vec::new();
    }
    rows.iter()
        .copied()
        .filter(|&i| {
            dataset
                .records
                .get(i)
                .is_some_and(|r| allowed.contains(&r.category.to_string()))
        })
        .collect()
}

/// Lowercased searchable fields of row `row`, joined by single spaces.
/// Missing columns and null cells contribute empty strings.
pub fn haystack(dataset: &Dataset, row: usize, searchable: &[String]) -> String {
    searchable
        .iter()
        .map(|col| {
            dataset
                .value(row, col)
                .map(|v| v.to_string())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Keep rows whose haystack contains every token as a literal substring.
pub fn filter_by_search(dataset: &Dataset, rows: &[usize], tokens: &[String], searchable: &[String]) -> Vec<usize> {
    if tokens.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .copied()
        .filter(|&i| {
            let hay = haystack(dataset, i, searchable);
            tokens.iter().all(|t| hay.contains(t.as_str()))
        })
        .collect()
}

/// Return indices of records that pass the category and search filters, in
/// dataset order.
pub fn filtered_indices(dataset: &Dataset, query: &FilterQuery, searchable: &[String]) -> Vec<usize> {
    let all: Vec<usize> = (0..dataset.len()).collect();
    let by_category = filter_by_category(dataset, &all, &query.categories);
    let tokens = tokenize(&query.search);
    filter_by_search(dataset, &by_category, &tokens, searchable)
}
