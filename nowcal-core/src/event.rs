//! Event types shared by the parser, the expander and the ranking pipeline.
//!
//! `RawEvent` is what a calendar feed says, verbatim. `Occurrence` is one
//! concrete, normalized instance of it that can be scored. `CachedEvent`
//! ties an occurrence back to the feed it came from.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::instant;

/// One calendar feed the user subscribed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarSource {
    pub name: String,
    pub url: String,
}

impl CalendarSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        CalendarSource {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl fmt::Display for CalendarSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A date value as it appeared in the feed.
///
/// `Text` holds values the calendar parser could not read; the instant
/// normalizer gets the final say on those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
    Text(String),
}

impl EventTime {
    /// The value in ICS basic format (`20240315T090000Z`, `20240315`, ...).
    pub fn to_ics_string(&self) -> String {
        match self {
            EventTime::Date(d) => d.format("%Y%m%d").to_string(),
            EventTime::DateTimeUtc(dt) => dt.format("%Y%m%dT%H%M%SZ").to_string(),
            EventTime::DateTimeFloating(dt) => dt.format("%Y%m%dT%H%M%S").to_string(),
            EventTime::DateTimeZoned { datetime, .. } => {
                datetime.format("%Y%m%dT%H%M%S").to_string()
            }
            EventTime::Text(s) => s.clone(),
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            EventTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%dT%H:%M:%S"), tzid)
            }
            EventTime::Text(s) => write!(f, "{}", s),
        }
    }
}

/// RRULE plus the EXDATEs that punch holes in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    /// The RRULE value without the `RRULE:` prefix, e.g. `FREQ=DAILY`
    pub rrule: String,
    pub exdates: Vec<EventTime>,
}

impl Recurrence {
    pub fn new(rrule: impl Into<String>) -> Self {
        Recurrence {
            rrule: rrule.into(),
            exdates: Vec::new(),
        }
    }
}

/// Series-level DURATION, stored in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDuration {
    pub seconds: i64,
}

impl EventDuration {
    pub fn from_std(duration: std::time::Duration) -> Self {
        EventDuration {
            seconds: i64::try_from(duration.as_secs()).unwrap_or(i64::MAX),
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::seconds(self.seconds)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

/// An event participant. Feeds routinely omit either half.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Attendee {
    /// Name if known, otherwise email, otherwise empty.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or_default()
    }
}

/// A VEVENT as parsed from a feed, before any expansion or normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Stable per logical event series
    pub uid: String,
    /// Set on a modified single instance of a series (RECURRENCE-ID)
    pub recurrence_id: Option<EventTime>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub attendees: Vec<Attendee>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub recurrence: Option<Recurrence>,
    pub duration: Option<EventDuration>,
    #[serde(default)]
    pub status: EventStatus,
}

impl RawEvent {
    pub fn new(uid: impl Into<String>) -> Self {
        RawEvent {
            uid: uid.into(),
            recurrence_id: None,
            summary: None,
            location: None,
            description: None,
            attendees: Vec::new(),
            start: None,
            end: None,
            recurrence: None,
            duration: None,
            status: EventStatus::Confirmed,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_times(mut self, start: EventTime, end: EventTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Normalized start instant.
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        instant::normalize(self.start.as_ref())
    }

    /// Normalized end instant, falling back to start + DURATION when DTEND is absent.
    pub fn end_instant(&self) -> Option<DateTime<Utc>> {
        match (&self.end, self.duration) {
            (Some(end), _) => instant::normalize(Some(end)),
            (None, Some(duration)) => self
                .start_instant()
                .and_then(|start| start.checked_add_signed(duration.as_duration())),
            (None, None) => None,
        }
    }
}

/// One concrete, non-recurring instance of an event.
///
/// There is no recurrence field on purpose: an occurrence can never be
/// expanded again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Unique within one expansion; equals `uid` for non-recurring events
    pub id: String,
    pub uid: String,
    pub recurrence_id: Option<EventTime>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub attendees: Vec<Attendee>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub status: EventStatus,
}

impl Occurrence {
    /// A non-recurring event taken as-is, with its dates normalized.
    pub fn single(event: &RawEvent) -> Self {
        Self::instance(
            event,
            event.uid.clone(),
            event.start_instant(),
            event.end_instant(),
        )
    }

    /// Copy every descriptive field of `event`, overriding identity and times.
    pub fn instance(
        event: &RawEvent,
        id: String,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        Occurrence {
            id,
            uid: event.uid.clone(),
            recurrence_id: event.recurrence_id.clone(),
            summary: event.summary.clone(),
            location: event.location.clone(),
            description: event.description.clone(),
            attendees: event.attendees.clone(),
            start,
            end,
            status: event.status.clone(),
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        Some(self.end? - self.start?)
    }

    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or("(No title)")
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// An occurrence annotated with the feed it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEvent {
    pub source: CalendarSource,
    pub occurrence: Occurrence,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_end_instant_falls_back_to_duration() {
        let mut event = RawEvent::new("dur-1");
        event.start = Some(EventTime::DateTimeUtc(
            Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap(),
        ));
        event.duration = Some(EventDuration { seconds: 45 * 60 });

        assert_eq!(
            event.end_instant(),
            Some(Utc.with_ymd_and_hms(2024, 3, 15, 9, 45, 0).unwrap())
        );
    }

    #[test]
    fn test_dtend_wins_over_duration() {
        let mut event = RawEvent::new("dur-2").with_times(
            EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()),
            EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()),
        );
        event.duration = Some(EventDuration { seconds: 60 });

        assert_eq!(
            event.end_instant(),
            Some(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_single_occurrence_keeps_uid_and_fields() {
        let mut event = RawEvent::new("abc@example.com")
            .with_summary("Planning")
            .with_times(
                EventTime::Text("2024-03-15T09:30:00Z".into()),
                EventTime::Text("not a date".into()),
            );
        event.attendees.push(Attendee {
            name: Some("Alice".into()),
            email: Some("alice@example.com".into()),
        });

        let occ = Occurrence::single(&event);

        assert_eq!(occ.id, "abc@example.com");
        assert_eq!(occ.title(), "Planning");
        assert_eq!(occ.attendees.len(), 1);
        assert!(occ.start.is_some());
        assert_eq!(occ.end, None);
        assert_eq!(occ.duration(), None);
    }

    #[test]
    fn test_attendee_display_name_prefers_name() {
        let both = Attendee {
            name: Some("Bob".into()),
            email: Some("bob@example.com".into()),
        };
        let email_only = Attendee {
            name: None,
            email: Some("carol@example.com".into()),
        };
        let neither = Attendee {
            name: None,
            email: None,
        };

        assert_eq!(both.display_name(), "Bob");
        assert_eq!(email_only.display_name(), "carol@example.com");
        assert_eq!(neither.display_name(), "");
    }
}
