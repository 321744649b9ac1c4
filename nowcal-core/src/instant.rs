//! Coerce feed date values into UTC instants.
//!
//! Everything here is total: a value that cannot be understood becomes `None`,
//! which the relevance scorer reads as "not relevant".

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::event::EventTime;

/// Naive datetime layouts tried for text values, in order.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const ICS_DATETIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const ICS_DATE_FORMAT: &str = "%Y%m%d";

/// Normalize an optional feed value into an instant.
pub fn normalize(value: Option<&EventTime>) -> Option<DateTime<Utc>> {
    match value? {
        EventTime::DateTimeUtc(dt) => Some(*dt),
        EventTime::DateTimeFloating(naive) => Some(naive.and_utc()),
        EventTime::Date(date) => midnight_utc(*date),
        EventTime::DateTimeZoned { datetime, tzid } => Some(zoned_to_utc(datetime, tzid)),
        EventTime::Text(text) => parse_instant(text),
    }
}

/// Parse an ISO-ish or ICS-basic string into an instant.
///
/// Values without an offset are read as UTC.
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(value) = parse_ics_value(text) {
        return normalize(Some(&value));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(midnight_utc)
}

/// Read an ICS basic-format value: `20240315` (DATE), `20240315T090000Z`
/// (UTC) or `20240315T090000` (floating).
pub(crate) fn parse_ics_value(text: &str) -> Option<EventTime> {
    let text = text.trim();
    if let Some(utc) = text.strip_suffix(['Z', 'z']) {
        return NaiveDateTime::parse_from_str(utc, ICS_DATETIME_FORMAT)
            .ok()
            .map(|naive| EventTime::DateTimeUtc(naive.and_utc()));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, ICS_DATETIME_FORMAT) {
        return Some(EventTime::DateTimeFloating(naive));
    }
    NaiveDate::parse_from_str(text, ICS_DATE_FORMAT)
        .ok()
        .map(EventTime::Date)
}

/// Look up an IANA zone name. Unknown names (e.g. Windows zone ids) yield `None`.
pub fn resolve_zone(tzid: &str) -> Option<Tz> {
    tzid.parse::<Tz>().ok()
}

/// Resolve a wall-clock time in `tzid` to UTC.
///
/// Unknown zones are read as UTC. A time skipped by a DST jump resolves to
/// the first valid instant after it; an ambiguous one to the earlier instant.
fn zoned_to_utc(datetime: &NaiveDateTime, tzid: &str) -> DateTime<Utc> {
    let Some(tz) = resolve_zone(tzid) else {
        tracing::debug!(tzid, "unknown TZID, reading wall-clock time as UTC");
        return datetime.and_utc();
    };

    match tz.from_local_datetime(datetime).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // In a DST gap: shift past it
        None => tz
            .from_local_datetime(&(*datetime + chrono::Duration::hours(1)))
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| datetime.and_utc()),
    }
}

fn midnight_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}
