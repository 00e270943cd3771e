use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::ViewerConfig;
use crate::data::cache::{DatasetCache, Loaded};
use crate::data::loader::{CatalogSource, DatasetSource, FileSource};
use crate::data::pipeline::{build_view, ViewRequest};
use crate::data::view::{base_column_choices, default_visible_columns, PresentationMode, ViewTable};
use crate::export::{write_to_path, ExportFormat};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// Owns the source and the memoised catalog.
    cache: DatasetCache<CatalogSource>,

    /// Current catalog and its region map.
    pub loaded: Loaded,

    /// Selected pricing region (None when the catalog has no price columns).
    pub selected_region: Option<String>,

    /// Categories currently ticked.
    pub selected_categories: BTreeSet<String>,

    /// All categories of the current catalog.
    pub all_categories: BTreeSet<String>,

    /// Non-price columns the user can show or hide, in display order.
    pub column_choices: Vec<String>,

    /// Columns currently ticked.
    pub visible_columns: BTreeSet<String>,

    pub search_query: String,

    pub presentation: PresentationMode,

    /// Table for the current selection (rebuilt by `recompute`).
    pub view: ViewTable,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Non-fatal data warnings (fallback, missing columns).
    pub warnings: Vec<String>,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        let mut cache = config.cache_for(config.catalog_source());
        let loaded = cache.load_or_reuse();
        let presentation = config.presentation;

        let mut state = Self {
            config,
            cache,
            loaded: loaded.clone(),
            selected_region: None,
            selected_categories: BTreeSet::new(),
            all_categories: BTreeSet::new(),
            column_choices: Vec::new(),
            visible_columns: BTreeSet::new(),
            search_query: String::new(),
            presentation,
            view: ViewTable::default(),
            status_message: None,
            warnings: Vec::new(),
        };
        state.set_loaded(loaded);
        state
    }

    /// Ingest a freshly loaded catalog: reset selections and rebuild the view.
    fn set_loaded(&mut self, loaded: Loaded) {
        self.all_categories = loaded.dataset.categories();
        self.selected_categories = self.all_categories.clone();

        self.column_choices = base_column_choices(
            &loaded.dataset,
            &loaded.regions,
            self.config.separator,
            &self.config.columns.base,
        );
        self.visible_columns = default_visible_columns(&self.column_choices, &self.config.columns.base);

        // Keep the region if the new catalog still has it.
        let keep = self
            .selected_region
            .as_deref()
            .is_some_and(|r| !loaded.regions.labels(r).is_empty());
        if !keep {
            self.selected_region = loaded.regions.first_region().map(str::to_string);
        }

        self.warnings = loaded.warnings();
        self.loaded = loaded;
        self.recompute();
    }

    pub fn source_description(&self) -> String {
        self.cache.source().describe()
    }

    /// Rebuild `view` after any control change.
    pub fn recompute(&mut self) {
        let request = ViewRequest {
            region: self.selected_region.clone(),
            categories: self.selected_categories.clone(),
            search: self.search_query.clone(),
        };
        let mut options = self.config.view_options();
        options.presentation = self.presentation;
        options.base_columns = self
            .column_choices
            .iter()
            .filter(|c| self.visible_columns.contains(*c))
            .cloned()
            .collect();

        self.view = build_view(
            &self.loaded.dataset,
            &self.loaded.regions,
            &request,
            &self.config.columns.searchable,
            &options,
        );
    }

    pub fn set_region(&mut self, region: String) {
        self.selected_region = Some(region);
        self.recompute();
    }

    pub fn set_presentation(&mut self, presentation: PresentationMode) {
        self.presentation = presentation;
        self.recompute();
    }

    pub fn toggle_category(&mut self, category: &str) {
        if !self.selected_categories.remove(category) {
            self.selected_categories.insert(category.to_string());
        }
        self.recompute();
    }

    pub fn select_all_categories(&mut self) {
        self.selected_categories = self.all_categories.clone();
        self.recompute();
    }

    pub fn select_no_categories(&mut self) {
        self.selected_categories.clear();
        self.recompute();
    }

    pub fn toggle_column(&mut self, column: &str) {
        if !self.visible_columns.remove(column) {
            self.visible_columns.insert(column.to_string());
        }
        self.recompute();
    }

    /// Back to the configured base columns.
    pub fn show_default_columns(&mut self) {
        self.visible_columns = default_visible_columns(&self.column_choices, &self.config.columns.base);
        self.recompute();
    }

    /// Point the viewer at a different file and load it.
    pub fn open_file(&mut self, path: PathBuf) {
        let source = FileSource::new(path, None, self.config.columns.roles.clone());
        self.cache = self.config.cache_for(CatalogSource::File(source));
        let loaded = self.cache.load_or_reuse();
        self.status_message = None;
        self.set_loaded(loaded);
    }

    /// Re-fetch from the current source.
    pub fn reload(&mut self) {
        let loaded = self.cache.refresh();
        self.status_message = None;
        self.set_loaded(loaded);
    }

    /// Write the current view. Failures land in `status_message`.
    pub fn export(&mut self, format: ExportFormat, path: &Path) {
        match write_to_path(&self.view, format, path) {
            Ok(_) => {
                self.status_message = Some(format!(
                    "Exported {} rows to {}",
                    self.view.row_count(),
                    path.display()
                ));
            }
            Err(e) => {
                log::error!("Export failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
