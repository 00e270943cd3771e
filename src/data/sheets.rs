//! Google Sheets catalog source.
//!
//! Reads one tab through the Sheets API v4 `values.get` endpoint. The access
//! token (or API key) is obtained outside the viewer, e.g. from
//! `gcloud auth print-access-token` for a service account, and handed over via
//! an environment variable.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::loader::{json_to_value, DatasetSource};
use super::model::{CellValue, ColumnRoles, Dataset};
use crate::error::DataError;

/// Sheets API base URL.
const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How requests are authenticated.
#[derive(Clone)]
pub enum SheetsAuth {
    /// OAuth2 access token sent as `Authorization: Bearer …`.
    BearerToken(String),
    /// API key for sheets shared publicly.
    ApiKey(String),
}

// Keep secrets out of logs.
impl std::fmt::Debug for SheetsAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsAuth::BearerToken(_) => f.write_str("BearerToken(..)"),
            SheetsAuth::ApiKey(_) => f.write_str("ApiKey(..)"),
        }
    }
}

impl SheetsAuth {
    /// Resolve credentials from environment variables, token first.
    pub fn from_env(token_var: Option<&str>, api_key_var: Option<&str>) -> Option<Self> {
        let read = |var: Option<&str>| {
            var.and_then(|v| std::env::var(v).ok())
                .filter(|s| !s.trim().is_empty())
        };
        read(token_var)
            .map(SheetsAuth::BearerToken)
            .or_else(|| read(api_key_var).map(SheetsAuth::ApiKey))
    }
}

/// `values.get` response body.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<JsonValue>>,
}

/// One tab of a remote spreadsheet.
#[derive(Debug, Clone)]
pub struct GoogleSheetsSource {
    pub sheet_id: String,
    pub tab: String,
    pub auth: Option<SheetsAuth>,
    pub roles: ColumnRoles,
}

impl GoogleSheetsSource {
    pub fn new(sheet_id: impl Into<String>, tab: impl Into<String>, auth: Option<SheetsAuth>, roles: ColumnRoles) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            tab: tab.into(),
            auth,
            roles,
        }
    }

    /// `…/spreadsheets/{id}/values/{'tab'}` with query parameters, percent-encoded.
    pub fn values_url(&self) -> Result<Url, DataError> {
        let mut url = Url::parse(SHEETS_API_URL).map_err(|e| DataError::unavailable(self.describe(), e))?;
        let range = format!("'{}'", self.tab.replace('\'', "''"));
        url.path_segments_mut()
            .map_err(|_| DataError::unavailable(self.describe(), "invalid API base URL"))?
            .push(&self.sheet_id)
            .push("values")
            .push(&range);
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE");
        if let Some(SheetsAuth::ApiKey(key)) = &self.auth {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    fn fetch(&self) -> Result<ValueRange, DataError> {
        let unavailable = |e: &dyn std::fmt::Display| DataError::unavailable(self.describe(), e);

        let Some(auth) = &self.auth else {
            return Err(unavailable(&"no Google credentials configured"));
        };
        if self.sheet_id.trim().is_empty() || self.tab.trim().is_empty() {
            return Err(unavailable(&"sheet id and tab name are required"));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| unavailable(&e))?;

        let mut request = client
            .get(self.values_url()?)
            .header(USER_AGENT, format!("price-viewer/{}", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json");
        if let SheetsAuth::BearerToken(token) = auth {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        log::info!("Fetching sheet {} tab '{}'", self.sheet_id, self.tab);
        let response = request.send().map_err(|e| unavailable(&e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(unavailable(&format!("Sheets API returned {status}: {message}")));
        }

        response.json::<ValueRange>().map_err(|e| unavailable(&e))
    }
}

impl DatasetSource for GoogleSheetsSource {
    fn load(&self) -> Result<Dataset, DataError> {
        let body = self.fetch()?;
        let dataset = dataset_from_values(body.values, &self.roles);
        log::info!("Loaded {} rows from Google Sheets", dataset.len());
        Ok(dataset)
    }

    fn describe(&self) -> String {
        format!("Google Sheet {} / {}", self.sheet_id, self.tab)
    }
}

/// First row is the header; the API omits trailing empty cells, which
/// `Dataset::from_rows` pads back with nulls.
fn dataset_from_values(values: Vec<Vec<JsonValue>>, roles: &ColumnRoles) -> Dataset {
    let mut rows = values.into_iter();
    let headers: Vec<String> = rows
        .next()
        .unwrap_or_default()
        .iter()
        .map(|v| json_to_value(v).to_string())
        .collect();
    let values: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(json_to_value).collect())
        .collect();
    Dataset::from_rows(headers, values, roles.clone())
}
