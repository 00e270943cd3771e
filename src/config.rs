use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::cache::DatasetCache;
use crate::data::loader::{CatalogSource, FileSource};
use crate::data::model::ColumnRoles;
use crate::data::sheets::{GoogleSheetsSource, SheetsAuth};
use crate::data::view::{PresentationMode, ViewOptions};
use crate::error::ConfigError;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "PRICE_VIEWER_CONFIG";

/// Config file picked up from the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "price-viewer.toml";

/// Top-level configuration. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Splits price columns into `label` and `region`.
    pub separator: char,
    pub presentation: PresentationMode,
    pub columns: ColumnsConfig,
    pub source: SourceConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            separator: '_',
            presentation: PresentationMode::default(),
            columns: ColumnsConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    #[serde(flatten)]
    pub roles: ColumnRoles,
    /// Preferred order of the descriptive columns in the table.
    pub base: Vec<String>,
    /// Fields concatenated into the search haystack.
    pub searchable: Vec<String>,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            roles: ColumnRoles::default(),
            base: ["REF", "Category", "Product Name", "Description"]
                .map(String::from)
                .to_vec(),
            searchable: ["REF", "Product Name", "Description", "Tags"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// Where the catalog comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Built-in sample catalog.
    #[default]
    Sample,
    File {
        path: PathBuf,
        #[serde(default)]
        sheet: Option<String>,
    },
    GoogleSheets {
        sheet_id: String,
        tab: String,
        #[serde(default = "default_token_env")]
        access_token_env: Option<String>,
        #[serde(default = "default_api_key_env")]
        api_key_env: Option<String>,
    },
}

fn default_token_env() -> Option<String> {
    Some("GOOGLE_OAUTH_ACCESS_TOKEN".to_string())
}

fn default_api_key_env() -> Option<String> {
    Some("GOOGLE_SHEETS_API_KEY".to_string())
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Explicit path, then `$PRICE_VIEWER_CONFIG`, then `./price-viewer.toml`,
    /// then defaults. Only the last step may be silently absent.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            return Self::load(fallback);
        }
        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Build the configured source. Credentials are resolved here, once.
    pub fn catalog_source(&self) -> CatalogSource {
        let roles = self.columns.roles.clone();
        match &self.source {
            SourceConfig::Sample => CatalogSource::Sample(roles),
            SourceConfig::File { path, sheet } => {
                CatalogSource::File(FileSource::new(path.clone(), sheet.clone(), roles))
            }
            SourceConfig::GoogleSheets {
                sheet_id,
                tab,
                access_token_env,
                api_key_env,
            } => {
                let auth = SheetsAuth::from_env(access_token_env.as_deref(), api_key_env.as_deref());
                if auth.is_none() {
                    log::warn!("No Google credentials found in {access_token_env:?} or {api_key_env:?}");
                }
                CatalogSource::GoogleSheets(GoogleSheetsSource::new(sheet_id.clone(), tab.clone(), auth, roles))
            }
        }
    }

    /// A cache around `source` using this config's separator and columns.
    pub fn cache_for(&self, source: CatalogSource) -> DatasetCache<CatalogSource> {
        DatasetCache::new(source, self.separator, self.columns.roles.clone())
            .with_base_columns(self.columns.base.clone())
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            base_columns: self.columns.base.clone(),
            separator: self.separator,
            presentation: self.presentation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ViewerConfig, ConfigError> {
        ViewerConfig::parse(text, Path::new("test.toml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.separator, '_');
        assert_eq!(config.presentation, PresentationMode::Label);
        assert_eq!(config.columns.roles, ColumnRoles::default());
        assert_eq!(config.columns.searchable.len(), 4);
        assert_eq!(config.source, SourceConfig::Sample);
    }

    #[test]
    fn overrides_columns_and_presentation() {
        let config = parse(
            r#"
            separator = "|"
            presentation = "label_with_region"

            [columns]
            category = "Primary Category"
            name = "Title"
            searchable = ["REF", "Title", "Tags"]
            "#,
        )
        .unwrap();

        assert_eq!(config.separator, '|');
        assert_eq!(config.presentation, PresentationMode::LabelWithRegion);
        assert_eq!(config.columns.roles.category, "Primary Category");
        assert_eq!(config.columns.roles.name, "Title");
        assert_eq!(config.columns.roles.reference, "REF");
        assert_eq!(config.columns.searchable, vec!["REF", "Title", "Tags"]);
        assert_eq!(config.columns.base.len(), 4);
        assert_eq!(config.view_options().separator, '|');
    }

    #[test]
    fn file_source() {
        let config = parse(
            r#"
            [source]
            kind = "file"
            path = "catalog.xlsx"
            sheet = "All Products"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.source,
            SourceConfig::File {
                path: PathBuf::from("catalog.xlsx"),
                sheet: Some("All Products".to_string()),
            }
        );
    }

    #[test]
    fn google_sheets_source_gets_default_env_vars() {
        let config = parse(
            r#"
            [source]
            kind = "google_sheets"
            sheet_id = "1AbC"
            tab = "All Products"
            "#,
        )
        .unwrap();
        let SourceConfig::GoogleSheets {
            access_token_env,
            api_key_env,
            ..
        } = config.source
        else {
            panic!("expected google sheets source");
        };
        assert_eq!(access_token_env.as_deref(), Some("GOOGLE_OAUTH_ACCESS_TOKEN"));
        assert_eq!(api_key_env.as_deref(), Some("GOOGLE_SHEETS_API_KEY"));
    }

    #[test]
    fn file_source_builds_a_file_catalog_source() {
        let config = ViewerConfig {
            source: SourceConfig::File {
                path: PathBuf::from("catalog.csv"),
                sheet: None,
            },
            ..ViewerConfig::default()
        };
        let CatalogSource::File(source) = config.catalog_source() else {
            panic!("expected file source");
        };
        assert_eq!(source.path, PathBuf::from("catalog.csv"));
    }

    #[test]
    fn bad_values_are_parse_errors() {
        assert!(matches!(parse("separator = \"ab\""), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            parse("[source]\nkind = \"ftp\""),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ViewerConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
