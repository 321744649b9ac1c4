//! Time windows used for expansion and relevance.

use chrono::{DateTime, Duration, Utc};

/// Closed interval `[from, to]` of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        TimeWindow { from, to }
    }

    /// Both ends inclusive.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.from && instant <= self.to
    }
}

/// How far behind and ahead of "now" events are surfaced (and expanded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelevanceWindow {
    pub lookbehind: Duration,
    pub lookahead: Duration,
}

impl RelevanceWindow {
    pub const LOOKBEHIND_HOURS: i64 = 1;
    pub const LOOKAHEAD_HOURS: i64 = 24;

    /// The window anchored at `now`: `[now - lookbehind, now + lookahead]`.
    pub fn around(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow::new(now - self.lookbehind, now + self.lookahead)
    }
}

impl Default for RelevanceWindow {
    /// 1 hour behind, 24 hours ahead
    fn default() -> Self {
        RelevanceWindow {
            lookbehind: Duration::hours(Self::LOOKBEHIND_HOURS),
            lookahead: Duration::hours(Self::LOOKAHEAD_HOURS),
        }
    }
}
