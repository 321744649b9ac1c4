//! RRULE expansion for recurring events.
//!
//! Turns a possibly-recurring event into the concrete occurrences that fall
//! inside a time window. Every occurrence of a series keeps the series'
//! nominal duration, and gets an identity derived from its own start.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rrule::RRuleSet;

use crate::error::{NowcalError, NowcalResult};
use crate::event::{EventTime, Occurrence, RawEvent, Recurrence};
use crate::instant::{normalize, parse_ics_value, resolve_zone};
use crate::window::{RelevanceWindow, TimeWindow};

/// Upper bound on instants produced for one series in one window.
pub const MAX_INSTANCES: u16 = 1000;

/// Expand `event` against the default relevance window anchored at `now`.
pub fn expand(event: &RawEvent, now: DateTime<Utc>) -> NowcalResult<Vec<Occurrence>> {
    expand_in(event, &RelevanceWindow::default().around(now))
}

/// Expand `event` into the occurrences that start inside `window`.
///
/// - A non-recurring event yields exactly one occurrence whose id is its uid.
/// - A recurring event yields one occurrence per rule instant in the window,
///   which may be none at all.
/// - A recurring event whose own start/end cannot be resolved, or whose rule
///   does not parse, is a `MalformedEvent` error.
pub fn expand_in(event: &RawEvent, window: &TimeWindow) -> NowcalResult<Vec<Occurrence>> {
    let Some(recurrence) = &event.recurrence else {
        return Ok(vec![Occurrence::single(event)]);
    };

    let start = event.start_instant().ok_or_else(|| {
        NowcalError::malformed(&event.uid, "recurring event has no readable start")
    })?;
    let end = event.end_instant().ok_or_else(|| {
        NowcalError::malformed(&event.uid, "recurring event has no readable end or duration")
    })?;
    let duration = end - start;

    let series_id = event
        .recurrence_id
        .as_ref()
        .map(EventTime::to_ics_string)
        .unwrap_or_else(|| event.uid.clone());

    let occurrences: Vec<Occurrence> = occurrence_starts(event, recurrence, start, window)?
        .into_iter()
        .map(|instant| {
            let id = format!("{}-{}", series_id, iso_string(instant));
            Occurrence::instance(event, id, Some(instant), Some(instant + duration))
        })
        .collect();

    tracing::debug!(
        uid = %event.uid,
        count = occurrences.len(),
        "expanded recurring event"
    );

    Ok(occurrences)
}

/// Start instants of `recurrence` inside `window`, both ends inclusive.
fn occurrence_starts(
    event: &RawEvent,
    recurrence: &Recurrence,
    start: DateTime<Utc>,
    window: &TimeWindow,
) -> NowcalResult<Vec<DateTime<Utc>>> {
    let rrule_str = build_rrule_string(event.start.as_ref(), start, recurrence);

    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        NowcalError::malformed(&event.uid, format!("failed to parse RRULE: {}", e))
    })?;

    // after/before bounds are widened by a second so that instants sitting
    // exactly on the window edges survive; the filter below is exact.
    let tz: rrule::Tz = Utc.into();
    let after = (window.from - Duration::seconds(1)).with_timezone(&tz);
    let before = (window.to + Duration::seconds(1)).with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(MAX_INSTANCES);
    if result.limited {
        tracing::warn!(
            uid = %event.uid,
            limit = MAX_INSTANCES,
            "recurrence produced too many instances, truncating"
        );
    }

    Ok(result
        .dates
        .iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| window.contains(*dt))
        .collect())
}

/// Build an iCalendar-format rule block for the rrule crate parser.
///
/// Zoned starts keep their TZID so the series follows local wall-clock time
/// across DST changes. Everything else is pinned to the normalized UTC start.
fn build_rrule_string(
    raw_start: Option<&EventTime>,
    start: DateTime<Utc>,
    recurrence: &Recurrence,
) -> String {
    let mut lines = Vec::new();

    lines.push(format!("DTSTART{}", ics_time_value(raw_start, start)));
    lines.push(format!("RRULE:{}", until_in_utc(&recurrence.rrule, raw_start)));

    for exdate in &recurrence.exdates {
        match normalize(Some(exdate)) {
            Some(instant) => lines.push(format!("EXDATE{}", ics_time_value(Some(exdate), instant))),
            None => tracing::debug!(exdate = %exdate, "ignoring unreadable EXDATE"),
        }
    }

    lines.join("\n")
}

/// Rewrite a DATE or floating `UNTIL=` as a UTC instant.
///
/// The DTSTART handed to the rule parser is UTC or zoned, and the parser
/// requires UNTIL in UTC for both. RFC 5545 feeds write UNTIL in DTSTART's
/// own form instead.
fn until_in_utc(rrule: &str, raw_start: Option<&EventTime>) -> String {
    rrule
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => {
                match until_instant(value, raw_start) {
                    Some(until) => format!("UNTIL={}", until.format("%Y%m%dT%H%M%SZ")),
                    None => part.to_string(),
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// A DATE covers its whole day. Local values are read in DTSTART's zone.
/// `None` for values already in UTC or unreadable.
fn until_instant(value: &str, raw_start: Option<&EventTime>) -> Option<DateTime<Utc>> {
    let local = match parse_ics_value(value)? {
        EventTime::Date(date) => date.and_hms_opt(23, 59, 59)?,
        EventTime::DateTimeFloating(naive) => naive,
        _ => return None,
    };

    let until = match raw_start {
        Some(EventTime::DateTimeZoned { tzid, .. }) if resolve_zone(tzid).is_some() => {
            EventTime::DateTimeZoned {
                datetime: local,
                tzid: tzid.clone(),
            }
        }
        _ => EventTime::DateTimeFloating(local),
    };
    normalize(Some(&until))
}

/// `;TZID=...:local` for known zones, `:utcZ` otherwise.
fn ics_time_value(raw: Option<&EventTime>, instant: DateTime<Utc>) -> String {
    match raw {
        Some(EventTime::DateTimeZoned { datetime, tzid }) if resolve_zone(tzid).is_some() => {
            format!(";TZID={}:{}", tzid, datetime.format("%Y%m%dT%H%M%S"))
        }
        _ => format!(":{}", instant.format("%Y%m%dT%H%M%SZ")),
    }
}

/// ISO 8601 with millisecond precision and a `Z` suffix.
fn iso_string(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
