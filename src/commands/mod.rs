pub mod config;
pub mod events;
pub mod note;
pub mod refresh;
pub mod sources;

use anyhow::{Context, Result};
use chrono::Utc;
use nowcal_core::{CacheStore, HttpFetcher, NowcalConfig, RefreshOutcome, Refresher};
use owo_colors::OwoColorize;

use crate::utils::tui;

pub type FeedRefresher = Refresher<HttpFetcher>;

pub fn require_sources(config: &NowcalConfig) -> Result<()> {
    if config.sources.is_empty() {
        anyhow::bail!(
            "No calendar sources configured.\n\n\
            Add your first feed with:\n  \
            nowcal sources add <name> <url>\n\n\
            Example:\n  \
            nowcal sources add work https://example.com/work.ics"
        );
    }
    Ok(())
}

/// A refresher over HTTP, starting from the on-disk cache.
pub fn open_refresher() -> Result<FeedRefresher> {
    let store = CacheStore::default_location()?;
    let path = store.path().to_path_buf();
    Refresher::with_store(HttpFetcher::new()?, store).with_context(|| {
        format!(
            "Could not read the event cache; delete {} to start over",
            path.display()
        )
    })
}

/// Refresh when forced, when nothing is cached yet, or when the cache is older
/// than the configured interval.
pub async fn refresh_if_stale(
    refresher: &FeedRefresher,
    config: &NowcalConfig,
    force: bool,
    show_progress: bool,
) -> Result<()> {
    let interval = config.refresh_interval()?;
    let stale = match refresher.cache().await {
        Some(cache) => cache.is_stale(Utc::now(), interval),
        None => true,
    };

    if force || stale {
        let outcome = refresh_with_spinner(refresher, config, show_progress).await;
        if let RefreshOutcome::Completed(report) = &outcome {
            for failure in &report.failures {
                eprintln!(
                    "{}",
                    format!("  {}: {}", failure.source.name, failure.error).red()
                );
            }
        }
    }
    Ok(())
}

pub async fn refresh_with_spinner(
    refresher: &FeedRefresher,
    config: &NowcalConfig,
    show_progress: bool,
) -> RefreshOutcome {
    if !show_progress {
        return refresher.refresh(&config.sources).await;
    }

    let spinner = tui::create_spinner(format!(
        "Refreshing {} {}",
        config.sources.len(),
        if config.sources.len() == 1 { "calendar" } else { "calendars" }
    ));
    let outcome = refresher.refresh(&config.sources).await;
    spinner.finish_and_clear();
    outcome
}
