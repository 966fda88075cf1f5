// Reads worksheet values through the Sheets v4 API.

use super::api_errors::{request_error, status_error, token_error};
use super::service_account::ServiceAccountAuth;
use crate::core::headaches::{RawTable, SyncError};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Arc;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Quotes a worksheet title for use as an A1 range.
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Splits the values grid into header and data rows.
fn into_table(values: Vec<Vec<serde_json::Value>>) -> Result<RawTable, SyncError> {
    let mut rows = values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect::<Vec<String>>());

    let header = rows
        .next()
        .filter(|header| header.iter().any(|cell| !cell.trim().is_empty()))
        .ok_or_else(|| SyncError::Schema("the sheet is empty; expected a header row".to_string()))?;

    Ok(RawTable {
        header,
        rows: rows.collect(),
    })
}

pub struct SheetsClient {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
}

impl SheetsClient {
    pub fn new(client: Client, auth: Arc<ServiceAccountAuth>) -> Self {
        Self { client, auth }
    }

    fn spreadsheet_url(spreadsheet_id: &str, extra: &[&str]) -> Result<Url, SyncError> {
        let mut url = Url::parse(SHEETS_API_URL)
            .map_err(|e| SyncError::Upstream(format!("bad Sheets URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SyncError::Upstream("bad Sheets URL".to_string()))?
            .push(spreadsheet_id)
            .extend(extra);
        Ok(url)
    }

    /// Title of the first worksheet (the form's response sheet).
    pub async fn first_sheet_title(&self, spreadsheet_id: &str) -> Result<String, SyncError> {
        let token = self.auth.get_access_token().await.map_err(token_error)?;
        let url = Self::spreadsheet_url(spreadsheet_id, &[])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await
            .map_err(|e| request_error(e, "reading spreadsheet metadata"))?;

        if !response.status().is_success() {
            return Err(status_error(response, "reading spreadsheet metadata").await);
        }

        let meta: SpreadsheetMeta = response
            .json()
            .await
            .map_err(|e| SyncError::Upstream(format!("unreadable spreadsheet metadata: {}", e)))?;

        meta.sheets
            .into_iter()
            .next()
            .map(|sheet| sheet.properties.title)
            .ok_or_else(|| SyncError::Schema("the spreadsheet has no worksheets".to_string()))
    }

    /// Reads `range` (A1 notation) as a header row plus data rows.
    pub async fn read_table(&self, spreadsheet_id: &str, range: &str) -> Result<RawTable, SyncError> {
        let token = self.auth.get_access_token().await.map_err(token_error)?;
        let url = Self::spreadsheet_url(spreadsheet_id, &["values", range])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| request_error(e, "reading spreadsheet values"))?;

        if !response.status().is_success() {
            return Err(status_error(response, "reading spreadsheet values").await);
        }

        let values: ValueRange = response
            .json()
            .await
            .map_err(|e| SyncError::Upstream(format!("unreadable spreadsheet values: {}", e)))?;

        tracing::debug!(rows = values.values.len(), "Fetched spreadsheet values");
        into_table(values.values)
    }
}
