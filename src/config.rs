use std::{io::ErrorKind, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{storage::DEFAULT_STORAGE_KEY, ticker::DEFAULT_TICK_INTERVAL};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Optional `config.json` inside the application directory. Every field has a default, so a
/// partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage_key: String,
    pub tick_interval_ms: u64,
    pub colors: bool,
    pub links: Links,
}

/// External sites shown next to the clock. They are only ever printed, never fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    pub calendar: String,
    pub mail: String,
    pub weather: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            colors: true,
            links: Links::default(),
        }
    }
}

impl Default for Links {
    fn default() -> Self {
        Self {
            calendar: "https://miro.com/app/board/uXjVLn2Wixc=/".to_owned(),
            mail: "https://mail.google.com/mail/u/0/?ogbl#inbox".to_owned(),
            weather: "https://www.jma.go.jp/bosai/#area_type=class20s&area_code=3120101&pattern=forecast"
                .to_owned(),
        }
    }
}

impl Settings {
    /// Reads `config.json` from `dir`. A missing file gives the defaults, and so does a file that
    /// can't be parsed, after a warning.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No configuration at {path:?}, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {path:?}")),
        };

        match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!("Ignoring unreadable configuration {path:?}: {e}");
                Ok(Self::default())
            }
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{Settings, CONFIG_FILE_NAME};

    #[test]
    fn missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;

        let settings = Settings::load(dir.path())?;

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.storage_key, "timeRecords");
        assert_eq!(settings.tick_interval(), Duration::from_secs(1));
        assert_eq!(
            settings.links.calendar,
            "https://miro.com/app/board/uXjVLn2Wixc=/"
        );
        assert_eq!(
            settings.links.mail,
            "https://mail.google.com/mail/u/0/?ogbl#inbox"
        );
        assert_eq!(
            settings.links.weather,
            "https://www.jma.go.jp/bosai/#area_type=class20s&area_code=3120101&pattern=forecast"
        );
        Ok(())
    }

    #[test]
    fn partial_file_overrides_named_fields() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"colors": false, "links": {"mail": "https://mail.example.com"}}"#,
        )?;

        let settings = Settings::load(dir.path())?;

        assert!(!settings.colors);
        assert_eq!(settings.links.mail, "https://mail.example.com");
        assert_eq!(settings.links.calendar, Settings::default().links.calendar);
        assert_eq!(settings.storage_key, "timeRecords");
        Ok(())
    }

    #[test]
    fn broken_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json")?;

        assert_eq!(Settings::load(dir.path())?, Settings::default());
        Ok(())
    }

    #[test]
    fn zero_interval_is_clamped() {
        let settings = Settings {
            tick_interval_ms: 0,
            ..Settings::default()
        };

        assert_eq!(settings.tick_interval(), Duration::from_millis(1));
    }
}
