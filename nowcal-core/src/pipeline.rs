//! Aggregation of every source's events into one ranked list.
//!
//! Raw per-source events go in, a best-first list of relevant occurrences
//! comes out. Nothing here is persisted: relevance depends on `now`, so the
//! list is rebuilt from the raw cache every time it is needed.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NowcalError;
use crate::event::{CachedEvent, CalendarSource, EventStatus, Occurrence, RawEvent};
use crate::instant;
use crate::recurrence::expand_in;
use crate::relevance::{Relevance, relevance_in};
use crate::window::RelevanceWindow;

/// Unexpanded events of one feed, as fetched in one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvents {
    pub source: CalendarSource,
    pub events: Vec<RawEvent>,
}

/// A relevant occurrence together with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEvent {
    #[serde(flatten)]
    pub event: CachedEvent,
    pub relevance: Relevance,
}

/// An event that was skipped instead of expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventIssue {
    pub source: String,
    pub uid: String,
    pub reason: String,
}

/// Output of [`build_relevant_list`]: ranked events best-first, plus the
/// events that had to be skipped along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelevantList {
    pub events: Vec<RankedEvent>,
    pub issues: Vec<EventIssue>,
}

impl RelevantList {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Expand, score, filter and order the events of every source.
pub fn build_relevant_list(sources: &[SourceEvents], now: DateTime<Utc>) -> RelevantList {
    build_relevant_list_in(sources, now, &RelevanceWindow::default())
}

pub fn build_relevant_list_in(
    sources: &[SourceEvents],
    now: DateTime<Utc>,
    window: &RelevanceWindow,
) -> RelevantList {
    let mut list = RelevantList::default();

    for source_events in sources {
        for event in expand_source(source_events, now, window, &mut list.issues) {
            if let Some(relevance) = relevance_in(&event.occurrence, now, window) {
                list.events.push(RankedEvent { event, relevance });
            }
        }
    }

    list.events.sort_by(|a, b| {
        a.relevance
            .cmp(&b.relevance)
            .then_with(|| a.event.occurrence.start.cmp(&b.event.occurrence.start))
            .then_with(|| a.event.occurrence.id.cmp(&b.event.occurrence.id))
            .then_with(|| a.event.source.name.cmp(&b.event.source.name))
    });

    list
}

/// All live occurrences of one source, tagged with it.
///
/// Generated instances that a RECURRENCE-ID override replaces are dropped,
/// as are cancelled occurrences.
fn expand_source(
    source_events: &SourceEvents,
    now: DateTime<Utc>,
    window: &RelevanceWindow,
    issues: &mut Vec<EventIssue>,
) -> Vec<CachedEvent> {
    let source = &source_events.source;
    let overrides = overridden_instants(&source_events.events);
    let expansion_window = window.around(now);

    let mut occurrences: Vec<Occurrence> = Vec::new();
    for event in &source_events.events {
        match expand_in(event, &expansion_window) {
            Ok(expanded) if event.is_recurring() => {
                let replaced = overrides.get(event.uid.as_str());
                occurrences.extend(expanded.into_iter().filter(|occ| {
                    !matches!((replaced, occ.start), (Some(set), Some(start)) if set.contains(&start))
                }));
            }
            Ok(expanded) => occurrences.extend(expanded),
            Err(NowcalError::MalformedEvent { uid, reason }) => {
                tracing::warn!(source = %source.name, uid = %uid, "skipping event: {}", reason);
                issues.push(EventIssue {
                    source: source.name.clone(),
                    uid,
                    reason,
                });
            }
            Err(e) => {
                tracing::warn!(source = %source.name, uid = %event.uid, "skipping event: {}", e);
                issues.push(EventIssue {
                    source: source.name.clone(),
                    uid: event.uid.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    occurrences
        .into_iter()
        .filter(|occ| occ.status != EventStatus::Cancelled)
        .map(|occurrence| CachedEvent {
            source: source.clone(),
            occurrence,
        })
        .collect()
}

/// uid -> instants replaced by a standalone RECURRENCE-ID override.
fn overridden_instants(events: &[RawEvent]) -> HashMap<&str, HashSet<DateTime<Utc>>> {
    let mut overrides: HashMap<&str, HashSet<DateTime<Utc>>> = HashMap::new();
    for event in events.iter().filter(|e| !e.is_recurring()) {
        if let Some(instant) = instant::normalize(event.recurrence_id.as_ref()) {
            overrides.entry(event.uid.as_str()).or_default().insert(instant);
        }
    }
    overrides
}
