use anyhow::Result;
use nowcal_core::{NowcalConfig, RefreshOutcome};
use owo_colors::OwoColorize;

pub async fn run() -> Result<()> {
    let config = NowcalConfig::load()?;
    super::require_sources(&config)?;

    let refresher = super::open_refresher()?;
    let report = match super::refresh_with_spinner(&refresher, &config, true).await {
        RefreshOutcome::Completed(report) => report,
        RefreshOutcome::Skipped => {
            println!("{}", "A refresh is already running".dimmed());
            return Ok(());
        }
    };

    for source in &config.sources {
        match report.failures.iter().find(|f| &f.source == source) {
            Some(failure) => println!("  {} {}", source.name, failure.error.red()),
            None => println!("  {} {}", source.name, "ok".green()),
        }
    }

    println!(
        "\nFetched {} events from {} of {} calendars",
        report.events,
        report.sources - report.failures.len(),
        report.sources
    );

    if !report.replaced {
        anyhow::bail!("Every calendar failed to refresh; keeping the previous cache");
    }

    Ok(())
}
