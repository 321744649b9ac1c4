//! ICS feed parsing using the icalendar crate's parser.

use crate::error::{NowcalError, NowcalResult};
use crate::event::{Attendee, EventDuration, EventStatus, EventTime, RawEvent, Recurrence};
use crate::instant::parse_ics_value;
use icalendar::{
    DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

/// Parse a whole feed into one `RawEvent` per VEVENT.
///
/// VEVENTs without a UID are skipped. Fails only when the text is not an
/// iCalendar document at all.
pub fn parse_calendar(content: &str) -> NowcalResult<Vec<RawEvent>> {
    if !content.contains("BEGIN:VCALENDAR") {
        return Err(NowcalError::IcsParse(
            "not an iCalendar document (no BEGIN:VCALENDAR)".to_string(),
        ));
    }

    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| NowcalError::IcsParse(e.to_string()))?;

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    let events = vevents
        .into_iter()
        .filter_map(|vevent| {
            let event = parse_vevent(vevent);
            if event.is_none() {
                tracing::warn!("skipping VEVENT without UID");
            }
            event
        })
        .collect();

    Ok(events)
}

/// VEVENTs may sit at the top level or inside a VCALENDAR component.
fn collect_vevents<'c, 'a>(components: &'c [Component<'a>], out: &mut Vec<&'c Component<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            out.push(component);
        } else {
            collect_vevents(&component.components, out);
        }
    }
}

fn parse_vevent(vevent: &Component) -> Option<RawEvent> {
    let uid = vevent.find_prop("UID")?.val.to_string();

    let summary = vevent.find_prop("SUMMARY").map(|p| p.val.to_string());
    let description = vevent.find_prop("DESCRIPTION").map(|p| p.val.to_string());
    let location = vevent.find_prop("LOCATION").map(|p| p.val.to_string());

    let start = vevent.find_prop("DTSTART").map(parse_time_property);
    let end = vevent.find_prop("DTEND").map(parse_time_property);
    let recurrence_id = vevent.find_prop("RECURRENCE-ID").map(parse_time_property);

    let duration = vevent
        .find_prop("DURATION")
        .and_then(|p| parse_duration(p.val.as_ref()));

    let status = vevent
        .find_prop("STATUS")
        .map(|p| match p.val.as_ref() {
            "TENTATIVE" => EventStatus::Tentative,
            "CANCELLED" => EventStatus::Cancelled,
            _ => EventStatus::Confirmed,
        })
        .unwrap_or_default();

    // Recurrence (RRULE, EXDATE)
    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let exdates: Vec<EventTime> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(parse_exdate_property)
        .collect();
    let recurrence = rrule.map(|rrule| Recurrence { rrule, exdates });

    let attendees: Vec<Attendee> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "ATTENDEE")
        .map(parse_attendee)
        .collect();

    Some(RawEvent {
        uid,
        recurrence_id,
        summary,
        location,
        description,
        attendees,
        start,
        end,
        recurrence,
        duration,
        status,
    })
}

/// DTSTART/DTEND/RECURRENCE-ID as an EventTime, keeping the raw text when
/// the calendar parser cannot read it.
fn parse_time_property(prop: &Property) -> EventTime {
    match DatePerhapsTime::try_from(prop) {
        Ok(dpt) => to_event_time(dpt),
        Err(_) => EventTime::Text(prop.val.to_string()),
    }
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        },
    }
}

/// EXDATE values, comma-separated, in DATE, UTC, floating or TZID form.
fn parse_exdate_property(prop: &Property) -> Vec<EventTime> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    prop.val
        .as_ref()
        .split(',')
        .filter_map(parse_ics_value)
        .map(|value| match (value, &tzid) {
            (EventTime::DateTimeFloating(datetime), Some(tzid)) => EventTime::DateTimeZoned {
                datetime,
                tzid: tzid.clone(),
            },
            (value, _) => value,
        })
        .collect()
}

/// Parse an ATTENDEE property
fn parse_attendee(prop: &Property) -> Attendee {
    let value: &str = prop.val.as_ref();
    let email = value
        .strip_prefix("mailto:")
        .or_else(|| value.strip_prefix("MAILTO:"))
        .unwrap_or(value)
        .trim();

    let name = prop
        .params
        .iter()
        .find(|p| p.key == "CN")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()))
        .filter(|n| !n.is_empty());

    Attendee {
        name,
        email: (!email.is_empty()).then(|| email.to_string()),
    }
}

/// Parse a DURATION value (PT45M, P1D, ...). Negative durations are ignored.
fn parse_duration(value: &str) -> Option<EventDuration> {
    let value = value.trim();
    if value.starts_with('-') {
        return None;
    }
    let duration = iso8601::duration(value.trim_start_matches('+')).ok()?;
    let std_duration: std::time::Duration = duration.into();
    Some(EventDuration::from_std(std_duration))
}
