// =============================================================================
// SPREADSHEET LOCATOR
// =============================================================================
//
// Finds the tracking spreadsheet inside a Drive folder.
//
// Tie-break when the folder holds several spreadsheets: take the one modified
// most recently. If that is not decidable (equal newest times, or a file with
// no modification time) the refresh fails with `AmbiguousSource` instead of
// guessing.

use super::api_errors::{request_error, status_error, token_error};
use super::service_account::ServiceAccountAuth;
use crate::core::headaches::{SpreadsheetRef, SyncError};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Drive search query for non-trashed spreadsheets directly in `folder_id`.
pub fn folder_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "'{}' in parents and mimeType='{}' and trashed=false",
        escaped, SPREADSHEET_MIME
    )
}

/// Picks the source spreadsheet from the folder listing.
pub fn select_spreadsheet(folder_id: &str, mut files: Vec<DriveFile>) -> Result<SpreadsheetRef, SyncError> {
    if files.is_empty() {
        return Err(SyncError::NotFound(format!(
            "no spreadsheet in Drive folder {}",
            folder_id
        )));
    }

    if files.len() > 1 {
        if files.iter().any(|f| f.modified_time.is_none()) {
            return Err(SyncError::AmbiguousSource(
                files.into_iter().map(|f| f.name).collect(),
            ));
        }

        files.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
        let newest = files[0].modified_time;
        let tied: Vec<&DriveFile> = files.iter().filter(|f| f.modified_time == newest).collect();
        if tied.len() > 1 {
            return Err(SyncError::AmbiguousSource(
                tied.into_iter().map(|f| f.name.clone()).collect(),
            ));
        }

        tracing::info!(
            candidates = files.len(),
            chosen = %files[0].name,
            "Several spreadsheets in folder; using the most recently modified"
        );
    }

    let file = files.swap_remove(0);
    Ok(SpreadsheetRef {
        id: file.id,
        name: file.name,
        modified_time: file.modified_time,
    })
}

pub struct DriveClient {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
}

impl DriveClient {
    pub fn new(client: Client, auth: Arc<ServiceAccountAuth>) -> Self {
        Self { client, auth }
    }

    /// Lists the spreadsheets directly inside `folder_id`.
    pub async fn list_spreadsheets(&self, folder_id: &str) -> Result<Vec<DriveFile>, SyncError> {
        let token = self.auth.get_access_token().await.map_err(token_error)?;
        let query = folder_query(folder_id);

        let response = self
            .client
            .get(DRIVE_FILES_URL)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name,modifiedTime)"),
                ("orderBy", "modifiedTime desc"),
                ("pageSize", "100"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await
            .map_err(|e| request_error(e, "listing Drive folder"))?;

        if !response.status().is_success() {
            return Err(status_error(response, "listing Drive folder").await);
        }

        let list: FileList = response
            .json()
            .await
            .map_err(|e| SyncError::Upstream(format!("unreadable Drive listing: {}", e)))?;

        tracing::debug!(count = list.files.len(), "Listed spreadsheets in Drive folder");
        Ok(list.files)
    }

    /// Lists the folder and picks the source spreadsheet.
    pub async fn locate_spreadsheet(&self, folder_id: &str) -> Result<SpreadsheetRef, SyncError> {
        let files = self.list_spreadsheets(folder_id).await?;
        select_spreadsheet(folder_id, files)
    }
}
