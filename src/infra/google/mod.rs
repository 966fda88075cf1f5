// =============================================================================
// GOOGLE MODULE
// =============================================================================
//
// Storage-provider side of the headache sync: service account auth, locating
// the spreadsheet in a Drive folder, and reading its first worksheet. The
// core only sees the `SheetSource` trait.
//
// **Setup:**
// 1. Create a service account and a JSON key in Google Cloud Console
// 2. Enable the Drive and Sheets APIs for the project
// 3. Share the Drive folder with the service account email (Viewer)
// 4. Set `SERVICE_ACCOUNT_JSON` (or `SERVICE_ACCOUNT_PATH`) and `DRIVE_FOLDER_ID`

pub mod api_errors;
pub mod drive_client;
pub mod google_sheet_source;
pub mod service_account;
pub mod sheets_client;

pub use drive_client::DriveClient;
pub use google_sheet_source::GoogleSheetSource;
pub use service_account::{
    CredentialSource, ServiceAccountAuth, DRIVE_READONLY_SCOPE, SHEETS_READONLY_SCOPE,
};
pub use sheets_client::SheetsClient;

use std::time::Duration;

/// Timeout for every call to Google (token, Drive, Sheets).
pub const GOOGLE_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for Google calls, with the request timeout applied.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(GOOGLE_TIMEOUT).build()
}
