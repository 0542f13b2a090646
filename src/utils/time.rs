use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime};

const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

/// This is the standard way of converting a date to a string in dayplan records.
pub fn date_to_record(date: NaiveDate) -> String {
    date.format(RECORD_DATE_FORMAT).to_string()
}

/// Reads a calendar date from a record. Full RFC 3339 timestamps are accepted as well and reduced
/// to the date they carry.
pub fn record_to_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, RECORD_DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|v| v.date_naive()))
        .with_context(|| format!("Can't read {value:?} as a date"))
}

/// Validates a clock time such as `09:30`. Empty means the task has no specific time.
pub fn parse_clock_time(value: &str) -> Result<Option<NaiveTime>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(Some)
        .with_context(|| format!("Can't read {value:?} as a time, expected HH:MM"))
}
