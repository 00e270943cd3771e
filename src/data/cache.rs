use std::sync::Arc;

use super::loader::{sample_dataset, DatasetSource};
use super::model::{ColumnRoles, Dataset};
use super::schema::{detect_regions, RegionMap};

/// Where the cached dataset came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetOrigin {
    Source,
    /// The source failed; the built-in sample stands in. Holds the failure.
    Sample { reason: String },
}

/// A loaded catalog plus everything derived from its header.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub dataset: Arc<Dataset>,
    pub regions: RegionMap,
    pub origin: DatasetOrigin,
}

impl Loaded {
    /// Messages worth showing the user: fallback reason and missing base columns.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let DatasetOrigin::Sample { reason } = &self.origin {
            out.push(format!("Showing sample data: {reason}"));
        }
        out.extend(self.dataset.schema_warnings().iter().map(ToString::to_string));
        out
    }
}

/// Caller-owned memo around a [`DatasetSource`].
///
/// The first [`load_or_reuse`](Self::load_or_reuse) hits the source, later
/// calls hand back the same `Arc`. Nothing expires on its own; use
/// [`refresh`](Self::refresh) or [`invalidate`](Self::invalidate).
pub struct DatasetCache<S> {
    source: S,
    separator: char,
    /// Roles for the sample catalog when the source fails.
    roles: ColumnRoles,
    /// Descriptive columns that must never be read as price columns.
    base_columns: Vec<String>,
    cached: Option<Loaded>,
}

impl<S: DatasetSource> DatasetCache<S> {
    pub fn new(source: S, separator: char, roles: ColumnRoles) -> Self {
        Self {
            source,
            separator,
            roles,
            base_columns: Vec::new(),
            cached: None,
        }
    }

    pub fn with_base_columns(mut self, base_columns: Vec<String>) -> Self {
        self.base_columns = base_columns;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load once, reuse afterwards. Never fails: an unavailable source is
    /// replaced by the sample catalog.
    pub fn load_or_reuse(&mut self) -> Loaded {
        match &self.cached {
            Some(loaded) => loaded.clone(),
            None => self.store(),
        }
    }

    /// Drop the cached copy and load again.
    pub fn refresh(&mut self) -> Loaded {
        self.invalidate();
        self.store()
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    fn store(&mut self) -> Loaded {
        let loaded = self.load_fresh();
        self.cached = Some(loaded.clone());
        loaded
    }

    fn load_fresh(&self) -> Loaded {
        let (dataset, origin) = match self.source.load() {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} rows with {} columns from {}",
                    dataset.len(),
                    dataset.columns.len(),
                    self.source.describe()
                );
                (dataset, DatasetOrigin::Source)
            }
            Err(e) => {
                log::warn!("{e}; falling back to sample data");
                let reason = e.to_string();
                (sample_dataset(&self.roles), DatasetOrigin::Sample { reason })
            }
        };

        // Rebuilt from scratch on every load; nothing carries over.
        let regions = detect_regions(&dataset.columns, self.separator, &dataset.roles, &self.base_columns);
        for warning in dataset.schema_warnings() {
            log::warn!("{warning}");
        }

        Loaded {
            dataset: Arc::new(dataset),
            regions,
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::data::model::CellValue;
    use crate::error::DataError;

    /// Counts loads; fails while `fail` is set.
    struct CountingSource {
        loads: Cell<usize>,
        fail: Cell<bool>,
        columns: Vec<&'static str>,
    }

    impl CountingSource {
        fn new(columns: Vec<&'static str>) -> Self {
            Self {
                loads: Cell::new(0),
                fail: Cell::new(false),
                columns,
            }
        }
    }

    impl DatasetSource for CountingSource {
        fn load(&self) -> Result<Dataset, DataError> {
            self.loads.set(self.loads.get() + 1);
            if self.fail.get() {
                return Err(DataError::unavailable(self.describe(), "sheet not found"));
            }
            let headers = self.columns.iter().map(|c| c.to_string()).collect();
            let row = self.columns.iter().map(|c| CellValue::Text(c.to_string())).collect();
            Ok(Dataset::from_rows(headers, vec![row], ColumnRoles::default()))
        }

        fn describe(&self) -> String {
            "counting source".to_string()
        }
    }

    #[test]
    fn loads_once_then_reuses() {
        let mut cache = DatasetCache::new(CountingSource::new(vec!["REF", "50_EU"]), '_', ColumnRoles::default());
        assert_eq!(cache.source().loads.get(), 0);

        let first = cache.load_or_reuse();
        let second = cache.load_or_reuse();

        assert_eq!(cache.source().loads.get(), 1);
        assert!(Arc::ptr_eq(&first.dataset, &second.dataset));
        assert_eq!(first.origin, DatasetOrigin::Source);
        assert_eq!(first.regions.labels("EU"), ["50"]);
    }

    #[test]
    fn refresh_reloads_and_rebuilds_regions() {
        let mut cache = DatasetCache::new(CountingSource::new(vec!["REF", "10_UK"]), '_', ColumnRoles::default());
        let before = cache.load_or_reuse();
        let after = cache.refresh();

        assert_eq!(cache.source().loads.get(), 2);
        assert!(!Arc::ptr_eq(&before.dataset, &after.dataset));
        assert_eq!(after.regions.regions().collect::<Vec<_>>(), vec!["UK"]);
    }

    #[test]
    fn invalidate_defers_the_reload() {
        let mut cache = DatasetCache::new(CountingSource::new(vec!["REF"]), '_', ColumnRoles::default());
        cache.load_or_reuse();
        cache.invalidate();
        assert_eq!(cache.source().loads.get(), 1);

        cache.load_or_reuse();
        assert_eq!(cache.source().loads.get(), 2);
    }

    #[test]
    fn unavailable_source_falls_back_to_sample() {
        let source = CountingSource::new(vec!["REF"]);
        source.fail.set(true);
        let mut cache = DatasetCache::new(source, '_', ColumnRoles::default());

        let loaded = cache.load_or_reuse();
        assert!(matches!(loaded.origin, DatasetOrigin::Sample { .. }));
        assert!(!loaded.dataset.is_empty());
        assert!(!loaded.regions.is_empty());

        let warnings = loaded.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("sheet not found"));

        // The fallback is cached too; a refresh retries the source.
        cache.load_or_reuse();
        assert_eq!(cache.source().loads.get(), 1);
        cache.source().fail.set(false);
        assert_eq!(cache.refresh().origin, DatasetOrigin::Source);
    }

    #[test]
    fn configured_base_columns_stay_out_of_the_region_map() {
        let source = CountingSource::new(vec!["REF", "Sub_Category", "50_EU"]);
        let mut cache = DatasetCache::new(source, '_', ColumnRoles::default())
            .with_base_columns(vec!["Sub_Category".to_string()]);
        let loaded = cache.load_or_reuse();
        assert_eq!(loaded.regions.regions().collect::<Vec<_>>(), vec!["EU"]);
    }

    #[test]
    fn missing_base_columns_surface_as_warnings() {
        let mut cache = DatasetCache::new(CountingSource::new(vec!["REF", "Category"]), '_', ColumnRoles::default());
        let warnings = cache.load_or_reuse().warnings();
        assert_eq!(warnings.len(), 2);
    }
}
