use anyhow::{Context, Result};
use chrono::Utc;
use dialoguer::Select;
use nowcal_core::{NowcalConfig, template};
use owo_colors::OwoColorize;

use crate::render::plain_label;

/// `index` is 1-based, matching the numbers `nowcal events` prints.
pub async fn run(index: Option<usize>) -> Result<()> {
    let config = NowcalConfig::load()?;
    super::require_sources(&config)?;

    let refresher = super::open_refresher()?;
    super::refresh_if_stale(&refresher, &config, false, true).await?;

    let list = refresher.relevant(Utc::now()).await.unwrap_or_default();
    if list.is_empty() {
        anyhow::bail!("No ongoing, upcoming or recently ended events to take notes for");
    }

    let chosen = match index {
        Some(n) if (1..=list.events.len()).contains(&n) => n - 1,
        Some(n) => anyhow::bail!(
            "No event #{} (there are {} relevant events)",
            n,
            list.events.len()
        ),
        None => {
            let labels: Vec<String> = list.events.iter().map(plain_label).collect();
            Select::new()
                .with_prompt("  Take notes for")
                .items(&labels)
                .default(0)
                .interact()?
        }
    };
    let event = &list.events[chosen].event;

    let notes_dir = config.notes_path();
    let path = notes_dir.join(template::note_file_name(event));

    if path.exists() {
        println!("{} {}", "Note already exists:".dimmed(), path.display());
        return Ok(());
    }

    let template_text = template::load(config.template_path().as_deref())?;
    let contents = template::render(&template_text, event);

    std::fs::create_dir_all(&notes_dir)
        .with_context(|| format!("Could not create {}", notes_dir.display()))?;
    std::fs::write(&path, contents)
        .with_context(|| format!("Could not write {}", path.display()))?;

    println!("{}", format!("Created: {}", path.display()).green());
    Ok(())
}
