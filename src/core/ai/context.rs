// =============================================================================
// RECORD CONTEXT
// =============================================================================
//
// Renders a snapshot's records into the text the model answers from.
//
// If every record fits inside the token budget, every record is listed. If
// not, the context switches to aggregate statistics over ALL records plus
// as many of the most recent records as still fit, and it says in plain words
// how many records are listed in full. The context never drops records
// without saying so.

use crate::core::headaches::HeadacheRecord;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// Default token budget for the record context.
pub const DEFAULT_CONTEXT_TOKENS: usize = 12_000;

const TOP_TRIGGERS: usize = 10;
const TOP_OTHERS: usize = 5;
const MAX_PEAK_DATES: usize = 5;

// =============================================================================
// TOKEN ESTIMATION
// =============================================================================

/// Estimates the number of tokens in a text string.
///
/// ~4 characters per token, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    (text.len() + 3) / 4
}

// =============================================================================
// CONTEXT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// Every record is listed.
    Full,
    /// Statistics cover all records; only the newest `listed` are itemised.
    Summary { listed: usize, total: usize },
}

#[derive(Debug, Clone)]
pub struct RecordContext {
    pub text: String,
    pub kind: ContextKind,
}

/// Collapses newlines and runs of whitespace in free-text cells.
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One line per record. Absent optional fields are left out.
pub fn format_record(record: &HeadacheRecord) -> String {
    let mut parts = vec![record.date.format("%Y-%m-%d (%a)").to_string()];

    if let Some(time) = record.start_time {
        parts.push(format!("start {}", time.format("%H:%M")));
    }
    if let Some(minutes) = record.duration_minutes {
        parts.push(format!("duration {} min", minutes));
    }

    let mut severity = format!("severity {}/10", record.severity);
    if record.severity_clamped {
        severity.push_str(" (entered value was outside 1-10)");
    }
    parts.push(severity);

    if !record.location.is_empty() {
        parts.push(format!("location: {}", one_line(&record.location)));
    }
    if !record.triggers.is_empty() {
        let triggers: Vec<String> = record.triggers.iter().map(|t| one_line(t)).collect();
        parts.push(format!("triggers: {}", triggers.join(", ")));
    }
    match (record.medication.as_deref().map(one_line), record.medication_count) {
        (Some(med), Some(count)) => parts.push(format!("medication: {} x{}", med, count)),
        (Some(med), None) => parts.push(format!("medication: {}", med)),
        (None, Some(count)) => parts.push(format!("medication count: {}", count)),
        (None, None) => {}
    }
    if let Some(had) = record.had_headache {
        parts.push(format!("headache: {}", if had { "yes" } else { "no" }));
    }
    if let Some(notes) = &record.notes {
        parts.push(format!("notes: {}", one_line(notes)));
    }

    format!("- {}", parts.join(" | "))
}

fn date_span(records: &[HeadacheRecord]) -> Option<(NaiveDate, NaiveDate)> {
    Some((records.first()?.date, records.last()?.date))
}

fn header_line(records: &[HeadacheRecord]) -> String {
    match date_span(records) {
        Some((first, last)) => format!(
            "Headache log: {} records from {} to {}.",
            records.len(),
            first,
            last
        ),
        None => "Headache log: 0 records.".to_string(),
    }
}

/// Smallest budget the configuration accepts. Below this the header and
/// the fixed prose alone would not fit.
pub const MIN_CONTEXT_TOKENS: usize = 256;

fn summary_text(header: &str, listed: usize, total: usize, stats: &[String], recent: &[String]) -> String {
    let mut text = format!(
        "{}\nThe log is too long to list in full. The statistics below cover all {} records. \
         Only the {} most recent of {} records are listed individually; older records appear \
         only in the statistics.\n\n{}",
        header,
        total,
        listed,
        total,
        stats.join("\n")
    );
    if !recent.is_empty() {
        text.push_str(RECENT_HEADING);
        text.push_str(&recent.join("\n"));
    }
    text
}

const RECENT_HEADING: &str = "\n\nMost recent records, oldest first:\n";

/// Cuts `text` to at most `max_tokens` estimated tokens on a char boundary.
fn clip_to_budget(mut text: String, max_tokens: usize) -> String {
    let max_bytes = max_tokens * 4;
    if text.len() > max_bytes {
        let mut end = max_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

/// Builds the context for `records` (which must be chronological). The
/// result never exceeds `max_tokens` estimated tokens.
pub fn build_context(records: &[HeadacheRecord], max_tokens: usize) -> RecordContext {
    let lines: Vec<String> = records.iter().map(format_record).collect();

    let full = format!(
        "{}\nAll records are listed below, oldest first.\n{}",
        header_line(records),
        lines.join("\n")
    );
    if estimate_tokens(&full) <= max_tokens {
        return RecordContext {
            text: full,
            kind: ContextKind::Full,
        };
    }

    let total = records.len();
    let header = header_line(records);
    let mut stats = summary_lines(records);

    // Statistics are ordered by importance; drop from the tail until the
    // fixed part fits. `total` stands in for `listed` so the digits never grow.
    while stats.len() > 1 && estimate_tokens(&summary_text(&header, total, total, &stats, &[])) > max_tokens {
        stats.pop();
    }

    // Walk back from the newest record while the lines still fit.
    let mut used = estimate_tokens(&summary_text(&header, total, total, &stats, &[]))
        + estimate_tokens(RECENT_HEADING);
    let mut listed = 0;
    for line in lines.iter().rev() {
        let cost = estimate_tokens(line) + 1;
        if used + cost > max_tokens {
            break;
        }
        used += cost;
        listed += 1;
    }

    let recent = &lines[lines.len() - listed..];
    let text = clip_to_budget(summary_text(&header, listed, total, &stats, recent), max_tokens);

    RecordContext {
        text,
        kind: ContextKind::Summary { listed, total },
    }
}

// =============================================================================
// STATISTICS
// =============================================================================

fn top_counts<'a>(values: impl Iterator<Item = &'a str>, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        let key = value.trim().to_lowercase();
        if !key.is_empty() {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(limit);
    sorted
}

fn render_counts(label: &str, counts: &[(String, usize)]) -> String {
    if counts.is_empty() {
        return format!("{}: none recorded", label);
    }
    let rendered: Vec<String> = counts
        .iter()
        .map(|(name, count)| format!("{} ({})", name, count))
        .collect();
    format!("{}: {}", label, rendered.join(", "))
}

/// Aggregate statistics over every record.
pub fn summarize(records: &[HeadacheRecord]) -> String {
    summary_lines(records).join("\n")
}

/// The statistics block, one line each, most important first.
fn summary_lines(records: &[HeadacheRecord]) -> Vec<String> {
    let Some((first, last)) = date_span(records) else {
        return vec!["No records.".to_string()];
    };

    let total = records.len();
    let severity_sum: u32 = records.iter().map(|r| r.severity as u32).sum();
    let max_severity = records.iter().map(|r| r.severity).max().unwrap_or(0);
    let min_severity = records.iter().map(|r| r.severity).min().unwrap_or(0);
    let peak_dates: Vec<String> = records
        .iter()
        .rev()
        .filter(|r| r.severity == max_severity)
        .take(MAX_PEAK_DATES)
        .map(|r| r.date.to_string())
        .collect();

    let mild = records.iter().filter(|r| r.severity <= 3).count();
    let moderate = records.iter().filter(|r| (4..=6).contains(&r.severity)).count();
    let severe = total - mild - moderate;

    let durations: Vec<u32> = records.iter().filter_map(|r| r.duration_minutes).collect();

    let mut by_month: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for record in records {
        *by_month
            .entry((record.date.year(), record.date.month()))
            .or_insert(0) += 1;
    }
    let months: Vec<String> = by_month
        .iter()
        .map(|((year, month), count)| format!("{}-{:02}: {}", year, month, count))
        .collect();

    let weekdays = top_counts(
        records.iter().map(|r| match r.date.weekday() {
            chrono::Weekday::Mon => "monday",
            chrono::Weekday::Tue => "tuesday",
            chrono::Weekday::Wed => "wednesday",
            chrono::Weekday::Thu => "thursday",
            chrono::Weekday::Fri => "friday",
            chrono::Weekday::Sat => "saturday",
            chrono::Weekday::Sun => "sunday",
        }),
        7,
    );
    let triggers = top_counts(
        records
            .iter()
            .flat_map(|r| r.triggers.iter().map(|t| t.as_str())),
        TOP_TRIGGERS,
    );
    let locations = top_counts(records.iter().map(|r| r.location.as_str()), TOP_OTHERS);
    let medications = top_counts(
        records.iter().filter_map(|r| r.medication.as_deref()),
        TOP_OTHERS,
    );

    let mut lines = vec![
        "Statistics:".to_string(),
        format!("- Records: {} between {} and {}", total, first, last),
        format!(
            "- Severity: average {:.1}, lowest {}, highest {} (most recent highest on: {})",
            severity_sum as f64 / total as f64,
            min_severity,
            max_severity,
            peak_dates.join(", ")
        ),
        format!(
            "- Severity bands: mild 1-3: {}, moderate 4-6: {}, severe 7-10: {}",
            mild, moderate, severe
        ),
    ];
    if !durations.is_empty() {
        let avg = durations.iter().map(|d| *d as f64).sum::<f64>() / durations.len() as f64;
        lines.push(format!(
            "- Duration: average {:.0} min over {} records with a duration",
            avg,
            durations.len()
        ));
    }
    lines.push(format!("- Records per month: {}", months.join(", ")));
    lines.push(format!("- {}", render_counts("Records per weekday", &weekdays)));
    lines.push(format!("- {}", render_counts("Most common triggers", &triggers)));
    lines.push(format!("- {}", render_counts("Most common locations", &locations)));
    lines.push(format!("- {}", render_counts("Most common medications", &medications)));

    let clamped = records.iter().filter(|r| r.severity_clamped).count();
    if clamped > 0 {
        lines.push(format!(
            "- {} records had a severity outside 1-10 and were clamped",
            clamped
        ));
    }

    lines
}
