use crate::correlator::{DEFAULT_WINDOW_MS, window_from_ms};
use crate::error::Result;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Tunables for a [`crate::tracker::NavigationTracker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TrackerConfig {
    /// How long a click may wait for its page load, in milliseconds
    pub window_ms: u64,
    /// Keep unmatched intents in the store so they survive a restart
    pub persist_pending: bool,
    /// Append every confirmed edge, repeats included, to the history log
    pub keep_history: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            persist_pending: true,
            keep_history: true,
        }
    }
}

impl TrackerConfig {
    pub fn window(&self) -> TimeDelta {
        window_from_ms(self.window_ms)
    }

    pub fn with_window_ms(mut self, window_ms: u64) -> Self {
        self.window_ms = window_ms;
        self
    }

    /// Reads the config file at `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
