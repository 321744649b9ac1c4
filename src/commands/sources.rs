use anyhow::Result;
use nowcal_core::NowcalConfig;
use owo_colors::OwoColorize;

pub fn list() -> Result<()> {
    let config = NowcalConfig::load()?;

    if config.sources.is_empty() {
        println!("{}", "No calendar sources configured".dimmed());
        return Ok(());
    }

    for source in &config.sources {
        println!("{} {}", source.name.bold(), source.url.dimmed());
    }
    Ok(())
}

pub fn add(name: &str, url: &str) -> Result<()> {
    let mut config = NowcalConfig::load()?;
    let added = config.add_source(name, url)?.clone();
    config.save()?;

    println!("{}", format!("Added {}", added).green());
    Ok(())
}

pub fn remove(name: &str) -> Result<()> {
    let mut config = NowcalConfig::load()?;
    let removed = config.remove_source(name)?;
    config.save()?;

    println!("{}", format!("Removed {}", removed.name).green());
    Ok(())
}
