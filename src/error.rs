use std::path::PathBuf;

use thiserror::Error;

/// Failures of the catalog data path.
#[derive(Debug, Error)]
pub enum DataError {
    /// The source could not produce a dataset (missing file, bad sheet, auth failure…).
    #[error("data unavailable from {source_name}: {reason}")]
    DataUnavailable { source_name: String, reason: String },

    /// An expected base column is absent from the loaded catalog.
    #[error("expected column '{column}' is missing from the catalog")]
    SchemaMismatch { column: String },
}

impl DataError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        DataError::DataUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures while serialising a view.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while reading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
