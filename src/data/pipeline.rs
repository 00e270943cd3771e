use std::collections::BTreeSet;

use super::filter::{filtered_indices, FilterQuery};
use super::model::Dataset;
use super::schema::RegionMap;
use super::view::{compose, ViewOptions, ViewTable};

/// Everything the user picked in the controls.
#[derive(Debug, Clone, Default)]
pub struct ViewRequest {
    pub region: Option<String>,
    pub categories: BTreeSet<String>,
    pub search: String,
}

/// Filter then compose: the one-way path from catalog to table.
pub fn build_view(
    dataset: &Dataset,
    regions: &RegionMap,
    request: &ViewRequest,
    searchable: &[String],
    options: &ViewOptions,
) -> ViewTable {
    let query = FilterQuery {
        categories: request.categories.clone(),
        search: request.search.clone(),
    };
    let rows = filtered_indices(dataset, &query, searchable);
    log::debug!(
        "{} of {} rows pass filters (region: {:?})",
        rows.len(),
        dataset.len(),
        request.region
    );
    compose(dataset, &rows, regions, request.region.as_deref(), options)
}
