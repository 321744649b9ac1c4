//! Meeting-note templates.
//!
//! A template is plain text with `{{placeholder}}` markers filled from one
//! event occurrence. Unknown placeholders are left as written.

use std::path::Path;

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::error::{NowcalError, NowcalResult};
use crate::event::CachedEvent;

const MAX_SLUG_LEN: usize = 50;

pub const DEFAULT_TEMPLATE: &str = "\
# {{summary}}

- **When:** {{start}} to {{end}}
- **Where:** {{location}}
- **Calendar:** {{source}}
- **Attendees:** {{attendees}}

## Agenda

{{description}}

## Notes

## Action items

- [ ]
";

/// The template at `path`, or the built-in one.
pub fn load(path: Option<&Path>) -> NowcalResult<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            NowcalError::Template(format!("Could not read {}: {}", path.display(), e))
        }),
        None => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}

/// Fill `template` from `event`, with times in the local zone.
pub fn render(template: &str, event: &CachedEvent) -> String {
    render_in(template, event, &Local)
}

pub fn render_in<Tz: TimeZone>(template: &str, event: &CachedEvent, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];

        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };

        let key = after[..close].trim();
        match placeholder(key, event, tz) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after[close + 2..];
    }

    out.push_str(rest);
    out
}

fn placeholder<Tz: TimeZone>(key: &str, event: &CachedEvent, tz: &Tz) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    let occ = &event.occurrence;
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let time = |value: Option<DateTime<Utc>>, fmt: &str| {
        value
            .map(|t| t.with_timezone(tz).format(fmt).to_string())
            .unwrap_or_default()
    };

    let value = match key {
        "summary" => text(&occ.summary),
        "location" => text(&occ.location),
        "description" => text(&occ.description),
        "attendees" => occ
            .attendees
            .iter()
            .map(|a| a.display_name())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        "start" => time(occ.start, "%Y-%m-%d %H:%M"),
        "end" => time(occ.end, "%Y-%m-%d %H:%M"),
        "date" => time(occ.start, "%Y-%m-%d"),
        "source" => event.source.name.clone(),
        _ => return None,
    };
    Some(value)
}

/// `YYYY-MM-DD-<slug>.md`, dated by the occurrence's local start.
pub fn note_file_name(event: &CachedEvent) -> String {
    note_file_name_in(event, &Local)
}

pub fn note_file_name_in<Tz: TimeZone>(event: &CachedEvent, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let occ = &event.occurrence;
    let mut slug: String = slug::slugify(occ.title()).chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug = "meeting".to_string();
    }

    match occ.start {
        Some(start) => format!("{}-{}.md", start.with_timezone(tz).format("%Y-%m-%d"), slug),
        None => format!("{}.md", slug),
    }
}
