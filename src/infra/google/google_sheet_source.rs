// Google-backed `SheetSource`: Drive locator + Sheets reader.

use super::drive_client::DriveClient;
use super::service_account::ServiceAccountAuth;
use super::sheets_client::{quote_sheet_title, SheetsClient};
use crate::core::headaches::{RawTable, SheetSource, SpreadsheetRef, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

pub struct GoogleSheetSource {
    drive: DriveClient,
    sheets: SheetsClient,
    folder_id: String,
    /// A1 range to read; the first worksheet when unset.
    range: Option<String>,
}

impl GoogleSheetSource {
    pub fn new(client: Client, auth: Arc<ServiceAccountAuth>, folder_id: String) -> Self {
        Self {
            drive: DriveClient::new(client.clone(), Arc::clone(&auth)),
            sheets: SheetsClient::new(client, auth),
            folder_id,
            range: None,
        }
    }

    pub fn with_range(mut self, range: Option<String>) -> Self {
        self.range = range.filter(|r| !r.trim().is_empty());
        self
    }
}

#[async_trait]
impl SheetSource for GoogleSheetSource {
    async fn fetch_table(&self) -> Result<(SpreadsheetRef, RawTable), SyncError> {
        let spreadsheet = self.drive.locate_spreadsheet(&self.folder_id).await?;

        let range = match &self.range {
            Some(range) => range.clone(),
            None => quote_sheet_title(&self.sheets.first_sheet_title(&spreadsheet.id).await?),
        };

        tracing::info!(
            spreadsheet = %spreadsheet.name,
            range = %range,
            "Reading headache spreadsheet"
        );

        let table = self.sheets.read_table(&spreadsheet.id, &range).await?;
        Ok((spreadsheet, table))
    }
}
