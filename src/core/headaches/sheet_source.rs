use super::headache_models::{RawTable, SpreadsheetRef};
use async_trait::async_trait;

// ============================================================================
// ERRORS
// ============================================================================

/// The service-account blob could not be turned into a working identity.
///
/// None of these variants carry the blob itself, only what was wrong with it.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Service account credential is malformed: {0}")]
    Malformed(String),

    #[error("Service account credential is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Identity provider rejected the service account: {0}")]
    Rejected(String),

    #[error("Could not reach the identity provider: {0}")]
    Unreachable(String),

    #[error("Could not read service account file: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a refresh did not produce a new snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("No spreadsheet found: {0}")]
    NotFound(String),

    #[error("Several spreadsheets could be the source ({}); remove the extras or make one the most recently modified", .0.join(", "))]
    AmbiguousSource(Vec<String>),

    #[error("Spreadsheet layout not usable: {0}")]
    Schema(String),

    #[error("Storage provider error: {0}")]
    Upstream(String),

    #[error("A refresh is already running")]
    RefreshInProgress,
}

// ============================================================================
// SOURCE TRAIT (PORT)
// ============================================================================

/// Where raw spreadsheet content comes from.
///
/// The Google implementation lives in the infra layer; tests use in-memory
/// fakes.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Locates the spreadsheet and reads its first worksheet.
    async fn fetch_table(&self) -> Result<(SpreadsheetRef, RawTable), SyncError>;
}

#[async_trait]
impl SheetSource for Box<dyn SheetSource> {
    async fn fetch_table(&self) -> Result<(SpreadsheetRef, RawTable), SyncError> {
        (**self).fetch_table().await
    }
}
