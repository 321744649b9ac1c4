//! The refresh driver: fetch every source, replace the cache, rank on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::cache::{CacheStore, EventCache};
use crate::error::NowcalResult;
use crate::event::{CalendarSource, RawEvent};
use crate::feed::FeedFetcher;
use crate::ics::parse_calendar;
use crate::pipeline::{RelevantList, SourceEvents, build_relevant_list};

/// A source whose events are missing from a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source: CalendarSource,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub refreshed_at: DateTime<Utc>,
    pub sources: usize,
    pub events: usize,
    pub failures: Vec<SourceFailure>,
    /// False when every source failed and the previous cache was kept
    pub replaced: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Another refresh was already running; this request was dropped.
    Skipped,
    Completed(RefreshReport),
}

/// Owns the event cache and keeps refreshes from overlapping.
pub struct Refresher<F> {
    fetcher: F,
    store: Option<CacheStore>,
    cache: RwLock<Option<Arc<EventCache>>>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag however the refresh ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<F: FeedFetcher> Refresher<F> {
    /// A refresher that keeps its cache in memory only.
    pub fn new(fetcher: F) -> Self {
        Refresher {
            fetcher,
            store: None,
            cache: RwLock::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// A refresher backed by `store`, starting from whatever it holds.
    pub fn with_store(fetcher: F, store: CacheStore) -> NowcalResult<Self> {
        let cached = store.load()?;
        Ok(Refresher {
            fetcher,
            store: Some(store),
            cache: RwLock::new(cached.map(Arc::new)),
            in_flight: AtomicBool::new(false),
        })
    }

    /// The current cache; `None` if no refresh has run yet.
    pub async fn cache(&self) -> Option<Arc<EventCache>> {
        self.cache.read().await.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Fetch and parse every source, then swap in the new cache.
    ///
    /// A failing source only loses its own events. If every source fails the
    /// previous cache stays in place. Requests arriving while a refresh is
    /// running return `Skipped`.
    pub async fn refresh(&self, sources: &[CalendarSource]) -> RefreshOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        }
        let _guard = InFlight(&self.in_flight);

        let mut fetched = Vec::new();
        let mut failures = Vec::new();

        for source in sources {
            match self.fetch_source(source).await {
                Ok(events) => {
                    tracing::debug!(source = %source.name, events = events.len(), "fetched source");
                    fetched.push(SourceEvents {
                        source: source.clone(),
                        events,
                    });
                }
                Err(e) => {
                    tracing::warn!(source = %source.name, url = %source.url, "source dropped from refresh: {}", e);
                    failures.push(SourceFailure {
                        source: source.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let refreshed_at = Utc::now();
        let cache = EventCache::new(refreshed_at, fetched);
        let events = cache.event_count();
        let replaced = sources.is_empty() || failures.len() < sources.len();

        if replaced {
            if let Some(store) = &self.store {
                if let Err(e) = store.save(&cache) {
                    tracing::warn!(path = %store.path().display(), "could not persist event cache: {}", e);
                }
            }
            *self.cache.write().await = Some(Arc::new(cache));
        }

        tracing::info!(
            sources = sources.len(),
            failed = failures.len(),
            events,
            replaced,
            "refresh finished"
        );

        RefreshOutcome::Completed(RefreshReport {
            refreshed_at,
            sources: sources.len(),
            events,
            failures,
            replaced,
        })
    }

    /// Rank the cached events against `now`; `None` if no refresh has run yet.
    pub async fn relevant(&self, now: DateTime<Utc>) -> Option<RelevantList> {
        let cache = self.cache().await?;
        Some(build_relevant_list(&cache.sources, now))
    }

    async fn fetch_source(&self, source: &CalendarSource) -> NowcalResult<Vec<RawEvent>> {
        let text = self.fetcher.fetch(&source.url).await?;
        parse_calendar(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NowcalError;
    use std::collections::HashMap;
    use tokio::sync::Notify;

    const WORK_ICS: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:standup\r\n\
SUMMARY:Standup\r\n\
DTSTART:20240101T090000Z\r\n\
DTEND:20240101T091500Z\r\n\
RRULE:FREQ=DAILY\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    /// Serves canned feed bodies by URL; unknown URLs fail like a 404.
    #[derive(Default)]
    struct FakeFetcher {
        feeds: HashMap<String, String>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeFetcher {
        fn with_feed(mut self, url: &str, body: &str) -> Self {
            self.feeds.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl FeedFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> NowcalResult<String> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.feeds
                .get(url)
                .cloned()
                .ok_or_else(|| NowcalError::transport(url, "HTTP 404 Not Found"))
        }
    }

    fn work() -> CalendarSource {
        CalendarSource::new("work", "https://example.com/work.ics")
    }

    fn broken() -> CalendarSource {
        CalendarSource::new("broken", "https://example.com/missing.ics")
    }

    fn garbled() -> CalendarSource {
        CalendarSource::new("garbled", "https://example.com/garbled.ics")
    }

    fn fetcher() -> FakeFetcher {
        FakeFetcher::default()
            .with_feed(&work().url, WORK_ICS)
            .with_feed(&garbled().url, "<html>oops</html>")
    }

    fn completed(outcome: RefreshOutcome) -> RefreshReport {
        match outcome {
            RefreshOutcome::Completed(report) => report,
            RefreshOutcome::Skipped => panic!("Expected a completed refresh"),
        }
    }

    #[tokio::test]
    async fn test_no_refresh_yet_is_distinct_from_empty() {
        let refresher = Refresher::new(fetcher());
        assert!(refresher.cache().await.is_none());
        assert!(refresher.relevant(Utc::now()).await.is_none());

        completed(refresher.refresh(&[]).await);
        let list = refresher.relevant(Utc::now()).await.expect("Should have a cache");
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_failing_sources_do_not_abort_refresh() {
        let refresher = Refresher::new(fetcher());

        let report = completed(refresher.refresh(&[broken(), work(), garbled()]).await);

        assert!(report.replaced);
        assert_eq!(report.events, 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].source.name, "broken");
        assert!(report.failures[0].error.contains("404"));
        assert_eq!(report.failures[1].source.name, "garbled");

        let cache = refresher.cache().await.unwrap();
        assert_eq!(cache.sources.len(), 1);
        assert_eq!(cache.sources[0].source.name, "work");
    }

    #[tokio::test]
    async fn test_relevant_ranks_cached_events() {
        let refresher = Refresher::new(fetcher());
        completed(refresher.refresh(&[work()]).await);

        let now = chrono::TimeZone::with_ymd_and_hms(&Utc, 2024, 3, 15, 9, 5, 0).unwrap();
        let list = refresher.relevant(now).await.unwrap();

        assert_eq!(list.events.len(), 2);
        assert_eq!(list.events[0].relevance, crate::relevance::Relevance::Ongoing);
        assert_eq!(list.events[0].event.source.name, "work");
    }

    #[tokio::test]
    async fn test_all_sources_failing_keeps_previous_cache() {
        let refresher = Refresher::new(fetcher());
        completed(refresher.refresh(&[work()]).await);
        let before = refresher.cache().await.unwrap();

        let report = completed(refresher.refresh(&[broken()]).await);

        assert!(!report.replaced);
        assert_eq!(refresher.cache().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_refresh_replaces_cache_wholesale() {
        let home = CalendarSource::new("home", "https://example.com/home.ics");
        let refresher = Refresher::new(fetcher().with_feed(&home.url, WORK_ICS));

        completed(refresher.refresh(&[work(), home.clone()]).await);
        assert_eq!(refresher.cache().await.unwrap().sources.len(), 2);

        completed(refresher.refresh(&[home.clone()]).await);
        let cache = refresher.cache().await.unwrap();
        assert_eq!(cache.sources.len(), 1);
        assert_eq!(cache.sources[0].source, home);
    }

    #[tokio::test]
    async fn test_overlapping_refresh_is_skipped() {
        let gate = Arc::new(Notify::new());
        let refresher = Refresher::new(FakeFetcher {
            gate: Some(gate.clone()),
            ..fetcher()
        });
        let sources = [work()];

        let (first, second) = tokio::join!(refresher.refresh(&sources), async {
            tokio::task::yield_now().await;
            assert!(refresher.is_refreshing());
            let outcome = refresher.refresh(&sources).await;
            gate.notify_one();
            outcome
        });

        assert_eq!(second, RefreshOutcome::Skipped);
        assert_eq!(completed(first).events, 1);
        assert!(!refresher.is_refreshing());
    }

    #[tokio::test]
    async fn test_store_is_written_and_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("events.json"));

        let refresher = Refresher::with_store(fetcher(), store.clone()).unwrap();
        completed(refresher.refresh(&[work()]).await);

        let reloaded = Refresher::with_store(fetcher(), store).unwrap();
        let cache = reloaded.cache().await.expect("Should load persisted cache");
        assert_eq!(cache.event_count(), 1);
    }
}
