use anyhow::Result;
use nowcal_core::{CacheStore, NowcalConfig};
use owo_colors::OwoColorize;

pub fn run() -> Result<()> {
    let config_path = NowcalConfig::config_path()?;
    let config = NowcalConfig::load()?;
    let store = CacheStore::default_location()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Cache:      {}", store.path().display());
    println!("  Notes:      {}", config.notes_path().display());
    if let Some(template) = config.template_path() {
        println!("  Template:   {}", template.display());
    }

    println!();
    println!("{}", "Settings".bold());
    println!("  Refresh every: {}", config.refresh_interval);
    println!("  Sources:       {}", config.sources.len());

    Ok(())
}
