//! The per-refresh event cache and its on-disk store.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NowcalError, NowcalResult};
use crate::pipeline::SourceEvents;

const CACHE_FILE: &str = "events.json";

/// Everything fetched by one refresh, unexpanded and unfiltered.
///
/// A new refresh replaces the whole cache; it is never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCache {
    pub refreshed_at: DateTime<Utc>,
    pub sources: Vec<SourceEvents>,
}

impl EventCache {
    pub fn new(refreshed_at: DateTime<Utc>, sources: Vec<SourceEvents>) -> Self {
        EventCache {
            refreshed_at,
            sources,
        }
    }

    pub fn event_count(&self) -> usize {
        self.sources.iter().map(|s| s.events.len()).sum()
    }

    /// Whether the cache is older than `interval`.
    pub fn is_stale(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        now - self.refreshed_at >= interval
    }
}

/// JSON file holding the last `EventCache`.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CacheStore { path: path.into() }
    }

    /// Store at `<cache_dir>/nowcal/events.json`.
    pub fn default_location() -> NowcalResult<Self> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| NowcalError::Config("Could not determine cache directory".into()))?
            .join("nowcal");
        Ok(Self::new(dir.join(CACHE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` if no refresh has ever been saved.
    pub fn load(&self) -> NowcalResult<Option<EventCache>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let cache = serde_json::from_str(&content)
            .map_err(|e| NowcalError::Serialization(e.to_string()))?;
        Ok(Some(cache))
    }

    /// Write through a temp file and rename, so readers never see half a cache.
    pub fn save(&self, cache: &EventCache) -> NowcalResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content =
            serde_json::to_string(cache).map_err(|e| NowcalError::Serialization(e.to_string()))?;

        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CalendarSource, EventTime, RawEvent, Recurrence};
    use chrono::TimeZone;

    fn sample_cache() -> EventCache {
        let standup = RawEvent::new("standup")
            .with_summary("Standup")
            .with_times(
                EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()),
                EventTime::Text("whenever".into()),
            )
            .with_recurrence(Recurrence::new("FREQ=DAILY"));

        EventCache::new(
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
            vec![SourceEvents {
                source: CalendarSource::new("work", "https://example.com/work.ics"),
                events: vec![standup],
            }],
        )
    }

    #[test]
    fn test_load_without_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("events.json"));

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_restores_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("nested/events.json"));
        let cache = sample_cache();

        store.save(&cache).unwrap();

        assert_eq!(store.load().unwrap(), Some(cache));
        assert!(!dir.path().join("nested/events.json.tmp").exists());
    }

    #[test]
    fn test_save_replaces_previous_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("events.json"));

        store.save(&sample_cache()).unwrap();
        let empty = EventCache::new(Utc.with_ymd_and_hms(2024, 3, 15, 11, 0, 0).unwrap(), vec![]);
        store.save(&empty).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.event_count(), 0);
    }

    #[test]
    fn test_corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = CacheStore::new(path).load().unwrap_err();
        assert!(matches!(err, NowcalError::Serialization(_)));
    }

    #[test]
    fn test_staleness() {
        let cache = sample_cache();
        let interval = Duration::minutes(15);

        assert!(!cache.is_stale(cache.refreshed_at + Duration::minutes(14), interval));
        assert!(cache.is_stale(cache.refreshed_at + Duration::minutes(15), interval));
    }
}
