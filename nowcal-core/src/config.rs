//! User settings: calendar sources, refresh interval, where notes go.

use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{NowcalError, NowcalResult};
use crate::event::CalendarSource;
use crate::feed::fetchable_url;

static DEFAULT_NOTES_PATH: &str = "~/notes";
static DEFAULT_REFRESH_INTERVAL: &str = "15m";

fn default_notes_dir() -> PathBuf {
    PathBuf::from(DEFAULT_NOTES_PATH)
}

fn default_refresh_interval() -> String {
    DEFAULT_REFRESH_INTERVAL.to_string()
}

/// Configuration at ~/.config/nowcal/config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowcalConfig {
    /// How old the event cache may get before it is refreshed (humantime, e.g. "15m")
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    /// Where meeting notes are created
    #[serde(default = "default_notes_dir")]
    pub notes_dir: PathBuf,

    /// Custom note template; the built-in one is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,

    #[serde(default)]
    pub sources: Vec<CalendarSource>,
}

impl Default for NowcalConfig {
    fn default() -> Self {
        NowcalConfig {
            refresh_interval: default_refresh_interval(),
            notes_dir: default_notes_dir(),
            template: None,
            sources: Vec::new(),
        }
    }
}

impl NowcalConfig {
    pub fn config_path() -> NowcalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NowcalError::Config("Could not determine config directory".into()))?
            .join("nowcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented config on first run.
    pub fn load() -> NowcalResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> NowcalResult<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()
            .map_err(|e| NowcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| NowcalError::Config(e.to_string()))
    }

    pub fn save(&self) -> NowcalResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> NowcalResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| NowcalError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| NowcalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> NowcalResult<()> {
        let contents = format!(
            "\
# nowcal configuration

# Refresh calendar feeds when the cache is older than this:
# refresh_interval = \"{}\"

# Where meeting notes are created:
# notes_dir = \"{}\"

# Custom note template (placeholders: {{{{summary}}}}, {{{{start}}}}, ...):
# template = \"~/notes/templates/meeting.md\"

# Calendar feeds (add with `nowcal sources add <name> <url>`):
# [[sources]]
# name = \"work\"
# url = \"https://example.com/calendar.ics\"
",
            DEFAULT_REFRESH_INTERVAL, DEFAULT_NOTES_PATH
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                NowcalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| NowcalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn find_source(&self, name: &str) -> Option<&CalendarSource> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Add a feed. Names must be unique and URLs http(s) or webcal(s).
    pub fn add_source(&mut self, name: &str, url: &str) -> NowcalResult<&CalendarSource> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NowcalError::Config("Source name cannot be empty".into()));
        }
        if self.find_source(name).is_some() {
            return Err(NowcalError::DuplicateSource(name.to_string()));
        }
        fetchable_url(url)?;

        self.sources.push(CalendarSource::new(name, url.trim()));
        Ok(&self.sources[self.sources.len() - 1])
    }

    pub fn remove_source(&mut self, name: &str) -> NowcalResult<CalendarSource> {
        let index = self
            .sources
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| NowcalError::SourceNotFound(name.to_string()))?;
        Ok(self.sources.remove(index))
    }

    pub fn refresh_interval(&self) -> NowcalResult<chrono::Duration> {
        let std_duration = humantime::parse_duration(&self.refresh_interval).map_err(|e| {
            NowcalError::Config(format!(
                "Invalid refresh_interval '{}': {}",
                self.refresh_interval, e
            ))
        })?;
        chrono::Duration::from_std(std_duration)
            .map_err(|e| NowcalError::Config(format!("refresh_interval out of range: {e}")))
    }

    /// `notes_dir` with `~` expanded.
    pub fn notes_path(&self) -> PathBuf {
        expand_tilde(&self.notes_dir)
    }

    pub fn template_path(&self) -> Option<PathBuf> {
        self.template.as_deref().map(expand_tilde)
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_load_creates_commented_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nowcal/config.toml");

        let config = NowcalConfig::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config, NowcalConfig::default());
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("# refresh_interval = \"15m\""));
        assert!(written.contains("{{summary}}"));
    }

    #[test]
    fn test_save_and_reload_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = NowcalConfig::default();
        config.refresh_interval = "5m".into();
        config.add_source("work", "https://example.com/work.ics").unwrap();
        config.add_source("team", "webcal://example.com/team.ics").unwrap();
        config.save_to(&path).unwrap();

        let reloaded = NowcalConfig::load_from(&path).unwrap();

        assert_eq!(reloaded, config);
        assert_eq!(reloaded.sources[1].url, "webcal://example.com/team.ics");
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "notes_dir = \"/tmp/meetings\"\n").unwrap();

        let config = NowcalConfig::load_from(&path).unwrap();

        assert_eq!(config.notes_dir, PathBuf::from("/tmp/meetings"));
        assert_eq!(config.refresh_interval, "15m");
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_add_source_rejects_duplicates_and_bad_urls() {
        let mut config = NowcalConfig::default();
        config.add_source("work", "https://example.com/a.ics").unwrap();

        assert!(matches!(
            config.add_source("work", "https://example.com/b.ics"),
            Err(NowcalError::DuplicateSource(_))
        ));
        assert!(matches!(
            config.add_source("files", "file:///tmp/cal.ics"),
            Err(NowcalError::InvalidUrl(_))
        ));
        assert!(matches!(
            config.add_source("  ", "https://example.com/c.ics"),
            Err(NowcalError::Config(_))
        ));
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_remove_source() {
        let mut config = NowcalConfig::default();
        config.add_source("work", "https://example.com/a.ics").unwrap();

        assert_eq!(config.remove_source("work").unwrap().name, "work");
        assert!(matches!(
            config.remove_source("work"),
            Err(NowcalError::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_refresh_interval_parsing() {
        let mut config = NowcalConfig::default();
        assert_eq!(config.refresh_interval().unwrap(), chrono::Duration::minutes(15));

        config.refresh_interval = "1h 30m".into();
        assert_eq!(config.refresh_interval().unwrap(), chrono::Duration::minutes(90));

        config.refresh_interval = "often".into();
        assert!(matches!(config.refresh_interval(), Err(NowcalError::Config(_))));
    }

    #[test]
    fn test_notes_path_expands_tilde() {
        let config = NowcalConfig::default();
        assert!(!config.notes_path().to_string_lossy().starts_with('~'));
    }
}
