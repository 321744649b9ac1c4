use anyhow::Result;
use chrono::Utc;
use nowcal_core::NowcalConfig;
use owo_colors::OwoColorize;

use crate::render::render_relevant_list;

pub async fn run(force_refresh: bool, json: bool) -> Result<()> {
    let config = NowcalConfig::load()?;
    super::require_sources(&config)?;

    let refresher = super::open_refresher()?;
    super::refresh_if_stale(&refresher, &config, force_refresh, !json).await?;

    let Some(list) = refresher.relevant(Utc::now()).await else {
        anyhow::bail!("No calendar data yet. Run `nowcal refresh` and check your sources.");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("{}", render_relevant_list(&list));

    if !list.issues.is_empty() {
        println!();
        println!(
            "{}",
            format!("{} event(s) skipped, run with --verbose for details", list.issues.len())
                .yellow()
        );
        for issue in &list.issues {
            tracing::debug!(source = %issue.source, uid = %issue.uid, "{}", issue.reason);
        }
    }

    Ok(())
}
