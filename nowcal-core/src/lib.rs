//! Core of nowcal: what is happening now, what just ended, what comes next.
//!
//! Calendar feeds are fetched and parsed into raw events, recurring series are
//! expanded around the current moment, and every occurrence is scored and
//! ranked by how relevant it is right now:
//! - `recurrence` expands series into concrete occurrences
//! - `relevance` scores one occurrence against `now`
//! - `pipeline` merges every source into one ranked list
//! - `refresh` fetches feeds and owns the event cache

pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod feed;
pub mod ics;
pub mod instant;
pub mod pipeline;
pub mod recurrence;
pub mod refresh;
pub mod relevance;
pub mod template;
pub mod window;

// Re-export event types at crate root for convenience
pub use event::*;

pub use cache::{CacheStore, EventCache};
pub use config::NowcalConfig;
pub use error::{NowcalError, NowcalResult};
pub use feed::{FeedFetcher, HttpFetcher};
pub use pipeline::{EventIssue, RankedEvent, RelevantList, SourceEvents, build_relevant_list};
pub use recurrence::expand;
pub use refresh::{RefreshOutcome, RefreshReport, Refresher, SourceFailure};
pub use relevance::{Relevance, relevance};
pub use window::{RelevanceWindow, TimeWindow};
