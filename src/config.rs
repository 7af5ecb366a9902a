use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{OverlayError, Result};

/// Polling configuration for the focus tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// How often the focused text field is read
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Length of one focus "minute"
    #[serde(default = "default_focus_interval_secs")]
    pub focus_interval_secs: u64,
    /// Upper bound on a single accessibility query
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Words counted as one manuscript page
    #[serde(default = "default_words_per_page")]
    pub words_per_page: f64,
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_focus_interval_secs() -> u64 {
    60
}

fn default_query_timeout_ms() -> u64 {
    750
}

fn default_words_per_page() -> f64 {
    300.0
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            focus_interval_secs: default_focus_interval_secs(),
            query_timeout_ms: default_query_timeout_ms(),
            words_per_page: default_words_per_page(),
        }
    }
}

impl TrackerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn focus_interval(&self) -> Duration {
        Duration::from_secs(self.focus_interval_secs.max(1))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

/// Ambient sound configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbienceConfig {
    /// Directory holding rain.mp3, ocean.wav, ...
    #[serde(default = "default_sounds_dir")]
    pub sounds_dir: PathBuf,
    /// Playback volume, 0.0 to 1.0
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_sounds_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("openlore").join("sounds"))
        .unwrap_or_else(|| PathBuf::from("sounds"))
}

fn default_volume() -> f32 {
    0.7
}

impl Default for AmbienceConfig {
    fn default() -> Self {
        Self {
            sounds_dir: default_sounds_dir(),
            volume: default_volume(),
        }
    }
}

/// Main configuration for the overlay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub ambience: AmbienceConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| OverlayError::ConfigError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| OverlayError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Default location: `<config_dir>/openlore/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("openlore").join("config.toml"))
    }

    /// Merge CLI arguments into this configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_cli_args(&mut self, sounds_dir: Option<PathBuf>) {
        if let Some(dir) = sounds_dir {
            self.ambience.sounds_dir = dir;
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.ambience.volume) {
            return Err(OverlayError::ConfigError(format!(
                "ambience.volume must be between 0.0 and 1.0, got {}",
                self.ambience.volume
            )));
        }
        if self.tracker.words_per_page <= 0.0 {
            return Err(OverlayError::ConfigError(format!(
                "tracker.words_per_page must be positive, got {}",
                self.tracker.words_per_page
            )));
        }
        Ok(())
    }
}
