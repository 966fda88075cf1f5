// Domain models for the headache log.
//
// Nothing in here knows about Google, Discord or HTTP. A `HeadacheRecord` is
// what the record parser produces from one spreadsheet row, and a
// `DataSnapshot` is the complete, immutable result of one sync pass.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Lowest severity a record can carry after clamping.
pub const MIN_SEVERITY: u8 = 1;

/// Highest severity a record can carry after clamping.
pub const MAX_SEVERITY: u8 = 10;

// ============================================================================
// RECORDS
// ============================================================================

/// One headache episode, parsed from a single spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadacheRecord {
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    /// Duration in minutes. Never negative.
    pub duration_minutes: Option<u32>,
    /// Always within `MIN_SEVERITY..=MAX_SEVERITY`.
    pub severity: u8,
    /// True when the sheet held a value outside the scale and it was clamped.
    pub severity_clamped: bool,
    /// Empty when the cell was blank.
    pub location: String,
    pub triggers: BTreeSet<String>,
    pub medication: Option<String>,
    pub medication_count: Option<u32>,
    pub notes: Option<String>,
    /// The form's "Headache?" answer, when the sheet has that column.
    pub had_headache: Option<bool>,
    /// 1-based row number in the sheet (the header is row 1).
    pub row_number: usize,
}

/// Which record field a parse warning is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Date,
    StartTime,
    Duration,
    Severity,
    Location,
    Triggers,
    Medication,
    MedicationCount,
    Notes,
    Headache,
}

impl RecordField {
    pub fn label(&self) -> &'static str {
        match self {
            RecordField::Date => "date",
            RecordField::StartTime => "start time",
            RecordField::Duration => "duration",
            RecordField::Severity => "severity",
            RecordField::Location => "location",
            RecordField::Triggers => "triggers",
            RecordField::Medication => "medication",
            RecordField::MedicationCount => "medication count",
            RecordField::Notes => "notes",
            RecordField::Headache => "headache",
        }
    }
}

/// A cell that could not be used as-is.
///
/// Warnings are kept on the snapshot so the `/status` command can show how
/// noisy the sheet is; they never stop a sync.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
    pub row_number: usize,
    pub field: RecordField,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} {}: {}", self.row_number, self.field.label(), self.message)
    }
}

// ============================================================================
// SNAPSHOTS
// ============================================================================

/// The spreadsheet a snapshot was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetRef {
    pub id: String,
    pub name: String,
    pub modified_time: Option<DateTime<Utc>>,
}

/// Header row plus data rows exactly as the provider returned them.
///
/// Rows may be shorter than the header (trailing blank cells are omitted by
/// the Sheets API).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Everything one sync pass produced. Immutable once built.
#[derive(Debug, Clone)]
pub struct DataSnapshot {
    /// Chronological: by date, then start time, then sheet row.
    pub records: Vec<HeadacheRecord>,
    pub synced_at: DateTime<Utc>,
    /// Rows dropped because date or severity could not be read.
    pub skipped_rows: usize,
    pub warnings: Vec<ParseWarning>,
    pub source: SpreadsheetRef,
}

impl DataSnapshot {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> RefreshSummary {
        RefreshSummary {
            record_count: self.records.len(),
            skipped_count: self.skipped_rows,
            synced_at: self.synced_at,
        }
    }
}

/// What `DataCache::current` hands out.
#[derive(Debug, Clone)]
pub enum SnapshotState {
    NeverSynced,
    Synced(Arc<DataSnapshot>),
}

impl SnapshotState {
    pub fn snapshot(&self) -> Option<&Arc<DataSnapshot>> {
        match self {
            SnapshotState::NeverSynced => None,
            SnapshotState::Synced(snapshot) => Some(snapshot),
        }
    }
}

/// Result of a successful refresh, as reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub record_count: usize,
    pub skipped_count: usize,
    pub synced_at: DateTime<Utc>,
}

/// Cache state plus the most recent refresh failure, for status displays.
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub state: SnapshotState,
    pub last_error: Option<String>,
}
