// =============================================================================
// RECORD PARSER
// =============================================================================
//
// Turns the raw cell text of the tracking sheet into `HeadacheRecord`s.
// Every spreadsheet quirk is absorbed here: header spelling, date and time
// formats, "7/10" style severities, free-form durations. Nothing downstream
// ever sees raw cells.
//
// Failure rules:
// - a missing date or severity COLUMN fails the whole parse (SchemaError)
// - an unreadable date or severity CELL drops that row and bumps the counter
// - an unreadable optional cell nulls the field and records a warning

use super::headache_models::{
    HeadacheRecord, ParseWarning, RawTable, RecordField, MAX_SEVERITY, MIN_SEVERITY,
};
use super::sheet_source::SyncError;
use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeSet;

/// Output of a parse pass, before it is stamped into a snapshot.
#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    pub records: Vec<HeadacheRecord>,
    pub skipped_rows: usize,
    pub warnings: Vec<ParseWarning>,
}

// =============================================================================
// COLUMN RESOLUTION
// =============================================================================

/// Header aliases, compared after `normalize_header`.
///
/// The long question-style names are what the check-in form writes.
const COLUMN_ALIASES: &[(&str, RecordField)] = &[
    ("date", RecordField::Date),
    ("headache date", RecordField::Date),
    ("start time", RecordField::StartTime),
    ("time", RecordField::StartTime),
    ("duration", RecordField::Duration),
    ("duration (minutes)", RecordField::Duration),
    ("duration (min)", RecordField::Duration),
    ("duration minutes", RecordField::Duration),
    ("severity", RecordField::Severity),
    ("pain scale", RecordField::Severity),
    ("pain level", RecordField::Severity),
    ("location", RecordField::Location),
    ("pain location", RecordField::Location),
    ("triggers", RecordField::Triggers),
    ("possible triggers", RecordField::Triggers),
    ("medication", RecordField::Medication),
    ("medication taken", RecordField::Medication),
    ("what medication did you take", RecordField::Medication),
    ("how many did you take", RecordField::MedicationCount),
    ("medication count", RecordField::MedicationCount),
    ("notes", RecordField::Notes),
    ("note", RecordField::Notes),
    ("relief", RecordField::Notes),
    ("relief/notes", RecordField::Notes),
    ("headache", RecordField::Headache),
];

/// Lowercases, collapses whitespace and strips trailing `:`/`?`.
fn normalize_header(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .to_lowercase()
        .trim_end_matches(|c: char| c == ':' || c == '?' || c.is_whitespace())
        .to_string()
}

/// Column index for each field the sheet provides.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ColumnMap {
    date: Option<usize>,
    start_time: Option<usize>,
    duration: Option<usize>,
    severity: Option<usize>,
    location: Option<usize>,
    triggers: Option<usize>,
    medication: Option<usize>,
    medication_count: Option<usize>,
    notes: Option<usize>,
    headache: Option<usize>,
}

impl ColumnMap {
    fn slot(&mut self, field: RecordField) -> &mut Option<usize> {
        match field {
            RecordField::Date => &mut self.date,
            RecordField::StartTime => &mut self.start_time,
            RecordField::Duration => &mut self.duration,
            RecordField::Severity => &mut self.severity,
            RecordField::Location => &mut self.location,
            RecordField::Triggers => &mut self.triggers,
            RecordField::Medication => &mut self.medication,
            RecordField::MedicationCount => &mut self.medication_count,
            RecordField::Notes => &mut self.notes,
            RecordField::Headache => &mut self.headache,
        }
    }
}

fn resolve_columns(header: &[String]) -> Result<(ColumnMap, usize, usize), SyncError> {
    let mut map = ColumnMap::default();

    for (idx, raw) in header.iter().enumerate() {
        let name = normalize_header(raw);
        if let Some((_, field)) = COLUMN_ALIASES.iter().find(|(alias, _)| *alias == name) {
            // First matching column wins when a sheet repeats a header.
            let slot = map.slot(*field);
            if slot.is_none() {
                *slot = Some(idx);
            }
        }
    }

    match (map.date, map.severity) {
        (Some(date), Some(severity)) => Ok((map, date, severity)),
        (date, severity) => {
            let mut missing = Vec::new();
            if date.is_none() {
                missing.push("date");
            }
            if severity.is_none() {
                missing.push("severity");
            }
            Err(SyncError::Schema(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )))
        }
    }
}

// =============================================================================
// CELL COERCION
// =============================================================================

/// Parses the date part of a cell. A trailing time (`01/05/2024 10:00:00`,
/// `2024-01-05T10:00`) is ignored.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let first = cell.split_whitespace().next()?;
    let date_part = first.split('T').next().unwrap_or(first);

    if date_part.contains('-') {
        return NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok();
    }

    let parts: Vec<&str> = date_part.split('/').collect();
    if parts.len() != 3 {
        return None;
    }

    if parts[0].len() == 4 {
        return NaiveDate::parse_from_str(date_part, "%Y/%m/%d").ok();
    }

    // Two-digit years need %y; %Y would read "24" as the year 24.
    let format = if parts[2].len() == 2 {
        "%m/%d/%y"
    } else {
        "%m/%d/%Y"
    };
    NaiveDate::parse_from_str(date_part, format).ok()
}

/// Accepts 12-hour (`9:30 PM`) and 24-hour (`21:30`) clock times.
pub fn parse_time(cell: &str) -> Option<NaiveTime> {
    let normalized = cell.trim().to_uppercase();
    ["%I:%M %p", "%I:%M:%S %p", "%I:%M%p", "%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&normalized, format).ok())
}

/// Reads `7`, `7.0` or `7/10`. Returns the raw (unclamped) value.
pub fn parse_severity(cell: &str) -> Option<i64> {
    let numerator = cell.split('/').next()?.trim();
    let value: f64 = numerator.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.round() as i64)
}

/// Reads a duration in minutes: `45`, `45 min`, `1.5 h`, `2 hours`.
pub fn parse_duration_minutes(cell: &str) -> Result<u32, String> {
    let lower = cell.trim().to_lowercase();
    let split_at = lower
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(lower.len());
    let (number, unit) = lower.split_at(split_at);

    let value: f64 = number
        .parse()
        .map_err(|_| format!("'{}' is not a duration", cell))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("'{}' is not a non-negative duration", cell));
    }

    let multiplier = match unit.trim().trim_end_matches('.') {
        "" | "m" | "min" | "mins" | "minute" | "minutes" => 1.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 60.0,
        other => return Err(format!("unknown duration unit '{}'", other)),
    };

    Ok((value * multiplier).round() as u32)
}

fn parse_yes_no(cell: &str) -> Option<bool> {
    match cell.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Splits a trigger cell into lowercase tags.
pub fn parse_triggers(cell: &str) -> BTreeSet<String> {
    cell.split(|c| c == ',' || c == ';')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn non_blank(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

// =============================================================================
// ROW PARSING
// =============================================================================

struct RowReader<'a> {
    row: &'a [String],
    row_number: usize,
    warnings: &'a mut Vec<ParseWarning>,
}

impl<'a> RowReader<'a> {
    fn cell(&self, idx: Option<usize>) -> &'a str {
        idx.and_then(|i| self.row.get(i))
            .map(|s| s.trim())
            .unwrap_or("")
    }

    fn warn(&mut self, field: RecordField, message: String) {
        self.warnings.push(ParseWarning {
            row_number: self.row_number,
            field,
            message,
        });
    }

    /// Runs an optional-field coercion; a blank cell is simply `None`.
    fn optional<T>(
        &mut self,
        idx: Option<usize>,
        field: RecordField,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Option<T> {
        let cell = self.cell(idx);
        if cell.is_empty() {
            return None;
        }
        match parse(cell) {
            Ok(value) => Some(value),
            Err(message) => {
                self.warn(field, message);
                None
            }
        }
    }
}

fn parse_row(
    columns: &ColumnMap,
    date_idx: usize,
    severity_idx: usize,
    row: &[String],
    row_number: usize,
    warnings: &mut Vec<ParseWarning>,
) -> Option<HeadacheRecord> {
    let mut reader = RowReader {
        row,
        row_number,
        warnings,
    };

    let date_cell = reader.cell(Some(date_idx));
    let Some(date) = parse_date(date_cell) else {
        if !date_cell.is_empty() {
            reader.warn(
                RecordField::Date,
                format!("unreadable date '{}', row dropped", date_cell),
            );
        }
        return None;
    };

    let severity_cell = reader.cell(Some(severity_idx));
    let Some(raw_severity) = parse_severity(severity_cell) else {
        reader.warn(
            RecordField::Severity,
            format!("unreadable severity '{}', row dropped", severity_cell),
        );
        return None;
    };

    let clamped = raw_severity.clamp(MIN_SEVERITY as i64, MAX_SEVERITY as i64);
    let severity_clamped = clamped != raw_severity;
    if severity_clamped {
        reader.warn(
            RecordField::Severity,
            format!("severity {} clamped to {}", raw_severity, clamped),
        );
    }

    let start_time = reader.optional(columns.start_time, RecordField::StartTime, |cell| {
        parse_time(cell).ok_or_else(|| format!("unreadable time '{}'", cell))
    });
    let duration_minutes =
        reader.optional(columns.duration, RecordField::Duration, parse_duration_minutes);
    let medication_count =
        reader.optional(columns.medication_count, RecordField::MedicationCount, |cell| {
            cell.parse::<u32>()
                .map_err(|_| format!("'{}' is not a whole number", cell))
        });
    let had_headache = reader.optional(columns.headache, RecordField::Headache, |cell| {
        parse_yes_no(cell).ok_or_else(|| format!("'{}' is not yes/no", cell))
    });

    Some(HeadacheRecord {
        date,
        start_time,
        duration_minutes,
        severity: clamped as u8,
        severity_clamped,
        location: reader.cell(columns.location).to_string(),
        triggers: parse_triggers(reader.cell(columns.triggers)),
        medication: non_blank(reader.cell(columns.medication)),
        medication_count,
        notes: non_blank(reader.cell(columns.notes)),
        had_headache,
        row_number,
    })
}

/// Parses a whole table. Only a missing required column is fatal.
pub fn parse_table(table: &RawTable) -> Result<ParsedRecords, SyncError> {
    let (columns, date_idx, severity_idx) = resolve_columns(&table.header)?;

    let mut parsed = ParsedRecords::default();
    for (offset, row) in table.rows.iter().enumerate() {
        let row_number = offset + 2;
        match parse_row(
            &columns,
            date_idx,
            severity_idx,
            row,
            row_number,
            &mut parsed.warnings,
        ) {
            Some(record) => parsed.records.push(record),
            None => parsed.skipped_rows += 1,
        }
    }

    parsed
        .records
        .sort_by_key(|r| (r.date, r.start_time, r.row_number));

    tracing::debug!(
        records = parsed.records.len(),
        skipped = parsed.skipped_rows,
        warnings = parsed.warnings.len(),
        "Parsed headache sheet"
    );

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn form_table(rows: Vec<Vec<String>>) -> RawTable {
        RawTable {
            header: row(&[
                "Timestamp",
                "Date",
                "Start Time",
                "Pain Scale",
                "Pain location",
                "Possible triggers",
                "What medication did you take?",
                "How many did you take?",
                "Note",
                "Headache?",
            ]),
            rows,
        }
    }

    #[test]
    fn test_form_headers_resolve() {
        let table = form_table(vec![row(&[
            "01/05/2024 21:40:00",
            "01/05/2024",
            "09:30 PM",
            "7",
            "Left temple",
            "Stress, screens",
            "Ibuprofen",
            "2",
            "Slept it off",
            "Yes",
        ])]);

        let parsed = parse_table(&table).unwrap();
        assert_eq!(parsed.skipped_rows, 0);
        let record = &parsed.records[0];
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(record.start_time, NaiveTime::from_hms_opt(21, 30, 0));
        assert_eq!(record.severity, 7);
        assert_eq!(record.location, "Left temple");
        assert!(record.triggers.contains("stress"));
        assert!(record.triggers.contains("screens"));
        assert_eq!(record.medication.as_deref(), Some("Ibuprofen"));
        assert_eq!(record.medication_count, Some(2));
        assert_eq!(record.notes.as_deref(), Some("Slept it off"));
        assert_eq!(record.had_headache, Some(true));
        assert_eq!(record.row_number, 2);
    }

    #[test]
    fn test_headers_case_and_order_insensitive() {
        let table = RawTable {
            header: row(&["SEVERITY", "  notes ", "DATE:"]),
            rows: vec![row(&["4", "fine", "2024-02-01"])],
        };
        let parsed = parse_table(&table).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].severity, 4);
        assert_eq!(parsed.records[0].notes.as_deref(), Some("fine"));
    }

    #[test]
    fn test_missing_required_column_is_schema_error() {
        let table = RawTable {
            header: row(&["Date", "Location"]),
            rows: vec![],
        };
        match parse_table(&table) {
            Err(SyncError::Schema(message)) => assert!(message.contains("severity")),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_all_optional_fields_empty_keeps_row() {
        let table = form_table(vec![row(&["", "2024-03-01", "", "5", "", "", "", "", "", ""])]);
        let parsed = parse_table(&table).unwrap();

        assert_eq!(parsed.skipped_rows, 0);
        assert!(parsed.warnings.is_empty());
        let record = &parsed.records[0];
        assert_eq!(record.start_time, None);
        assert_eq!(record.duration_minutes, None);
        assert_eq!(record.medication, None);
        assert_eq!(record.medication_count, None);
        assert_eq!(record.notes, None);
        assert_eq!(record.had_headache, None);
        assert!(record.triggers.is_empty());
        assert_eq!(record.location, "");
    }

    #[test]
    fn test_short_rows_are_padded() {
        // The Sheets API omits trailing empty cells.
        let table = form_table(vec![row(&["", "2024-03-01", "", "5"])]);
        let parsed = parse_table(&table).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_severity_out_of_range_is_clamped_and_flagged() {
        let table = RawTable {
            header: row(&["Date", "Severity"]),
            rows: vec![row(&["2024-01-01", "15"]), row(&["2024-01-02", "0"])],
        };
        let parsed = parse_table(&table).unwrap();

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].severity, 10);
        assert!(parsed.records[0].severity_clamped);
        assert_eq!(parsed.records[1].severity, 1);
        assert!(parsed.records[1].severity_clamped);
        assert_eq!(parsed.warnings.len(), 2);
        assert!(parsed
            .warnings
            .iter()
            .all(|w| w.field == RecordField::Severity));
    }

    #[test]
    fn test_record_count_is_rows_minus_unparseable_required() {
        let table = RawTable {
            header: row(&["Date", "Severity", "Start Time"]),
            rows: vec![
                row(&["2024-01-01", "3", ""]),
                row(&["not a date", "3", ""]),
                row(&["2024-01-03", "", ""]),
                row(&[]),
                row(&["2024-01-05", "8/10", "nonsense"]),
            ],
        };
        let parsed = parse_table(&table).unwrap();

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped_rows, 3);
        // The bad optional time nulls the field but keeps the row.
        assert_eq!(parsed.records[1].start_time, None);
        assert!(parsed
            .warnings
            .iter()
            .any(|w| w.field == RecordField::StartTime && w.row_number == 6));
    }

    #[test]
    fn test_records_sorted_chronologically() {
        let table = RawTable {
            header: row(&["Date", "Severity", "Start Time"]),
            rows: vec![
                row(&["2024-01-10", "5", ""]),
                row(&["2024-01-01", "3", "8:00 PM"]),
                row(&["2024-01-01", "4", "7:00 AM"]),
            ],
        };
        let parsed = parse_table(&table).unwrap();
        let severities: Vec<u8> = parsed.records.iter().map(|r| r.severity).collect();
        assert_eq!(severities, vec![4, 3, 5]);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(parse_date("2024-01-05"), expected);
        assert_eq!(parse_date("01/05/2024"), expected);
        assert_eq!(parse_date("1/5/2024"), expected);
        assert_eq!(parse_date("1/5/24"), expected);
        assert_eq!(parse_date("01/05/2024 13:22:10"), expected);
        assert_eq!(parse_date("2024-01-05T10:00:00"), expected);
        assert_eq!(parse_date("13/45/2024"), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration_minutes("45"), Ok(45));
        assert_eq!(parse_duration_minutes("45 min"), Ok(45));
        assert_eq!(parse_duration_minutes("1.5 h"), Ok(90));
        assert_eq!(parse_duration_minutes("2 hours"), Ok(120));
        assert!(parse_duration_minutes("-10").is_err());
        assert!(parse_duration_minutes("a while").is_err());
        assert!(parse_duration_minutes("3 days").is_err());
    }

    #[test]
    fn test_parse_triggers_dedupes() {
        let tags = parse_triggers("Stress; stress , Red Wine,,");
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("red wine"));
    }
}
