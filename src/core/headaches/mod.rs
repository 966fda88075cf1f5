pub mod data_cache;
pub mod headache_models;
pub mod headache_service;
pub mod record_parser;
pub mod sheet_source;

pub use data_cache::DataCache;
pub use headache_models::{
    CacheStatus, DataSnapshot, HeadacheRecord, ParseWarning, RawTable, RecordField,
    RefreshSummary, SnapshotState, SpreadsheetRef,
};
pub use headache_service::HeadacheService;
pub use sheet_source::{CredentialError, SheetSource, SyncError};
