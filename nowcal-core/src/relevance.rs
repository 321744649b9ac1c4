//! Temporal relevance of an occurrence relative to "now".

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Occurrence;
use crate::window::RelevanceWindow;

/// How an occurrence relates to the present moment.
///
/// Ordering puts `Ongoing` first, then everything else by minutes away from
/// now (nearest first). At equal minutes an upcoming event goes before one
/// that just ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relevance {
    Ongoing,
    /// Whole minutes since the occurrence ended
    RecentlyEnded { minutes: i64 },
    /// Whole minutes until the occurrence starts
    Upcoming { minutes: i64 },
}

impl Relevance {
    /// Minutes away from now; `None` for ongoing events.
    pub fn minutes(&self) -> Option<i64> {
        match self {
            Relevance::Ongoing => None,
            Relevance::RecentlyEnded { minutes } | Relevance::Upcoming { minutes } => {
                Some(*minutes)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Relevance::Ongoing => "now",
            Relevance::RecentlyEnded { .. } => "just ended",
            Relevance::Upcoming { .. } => "upcoming",
        }
    }

    fn sort_key(&self) -> (u8, i64, u8) {
        match self {
            Relevance::Ongoing => (0, 0, 0),
            Relevance::Upcoming { minutes } => (1, *minutes, 0),
            Relevance::RecentlyEnded { minutes } => (1, *minutes, 1),
        }
    }
}

impl Ord for Relevance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Relevance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Score `occurrence` against `now` using the default window.
///
/// `None` means "not relevant": unknown start/end, ended more than an hour
/// ago, starting more than a day ahead, or inverted times.
pub fn relevance(occurrence: &Occurrence, now: DateTime<Utc>) -> Option<Relevance> {
    relevance_in(occurrence, now, &RelevanceWindow::default())
}

pub fn relevance_in(
    occurrence: &Occurrence,
    now: DateTime<Utc>,
    window: &RelevanceWindow,
) -> Option<Relevance> {
    let (start, end) = (occurrence.start?, occurrence.end?);
    let cutoff_behind = now - window.lookbehind;
    let cutoff_ahead = now + window.lookahead;

    if start < now && now < end {
        Some(Relevance::Ongoing)
    } else if end < now && end >= cutoff_behind {
        Some(Relevance::RecentlyEnded {
            minutes: (now - end).num_minutes(),
        })
    } else if start > now && start <= cutoff_ahead {
        Some(Relevance::Upcoming {
            minutes: (start - now).num_minutes(),
        })
    } else {
        None
    }
}
