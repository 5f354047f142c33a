//! Engine configuration.
//!
//! Every setting has a default, so a missing or malformed configuration file
//! never prevents a wizard from opening.

use std::{env, fs, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable naming a JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "WIZARD_ENGINE_CONFIG";
/// Environment variable overriding [`EngineConfig::lookup_debounce_ms`].
pub const LOOKUP_DEBOUNCE_ENV: &str = "WIZARD_LOOKUP_DEBOUNCE_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Quiet period before a lookup request is sent.
    pub lookup_debounce_ms: u64,
    /// Disabled option shown while the parent field is empty. `{parent}` expands to the parent label.
    pub placeholder_label: String,
    /// Disabled option shown while options are loading.
    pub loading_label: String,
    /// Disabled option shown after the options provider failed.
    pub error_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookup_debounce_ms: 400,
            placeholder_label: "Select {parent} first".to_string(),
            loading_label: "Loading…".to_string(),
            error_label: "Could not load options".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Loads the file named by `WIZARD_ENGINE_CONFIG`, then applies environment overrides.
    pub fn load() -> Self {
        let mut config = config_path()
            .and_then(|path| match fs::read_to_string(&path) {
                Ok(content) => Some((path, content)),
                Err(error) => {
                    warn!(path = %path.display(), %error, "wizard engine config unreadable; using defaults");
                    None
                }
            })
            .and_then(|(path, content)| match Self::from_json_str(&content) {
                Ok(config) => Some(config),
                Err(error) => {
                    warn!(path = %path.display(), %error, "wizard engine config malformed; using defaults");
                    None
                }
            })
            .unwrap_or_default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = env::var(LOOKUP_DEBOUNCE_ENV)
            && let Ok(milliseconds) = raw.trim().parse::<u64>()
        {
            self.lookup_debounce_ms = milliseconds;
        }
    }

    pub fn lookup_debounce(&self) -> Duration {
        Duration::from_millis(self.lookup_debounce_ms)
    }

    /// Placeholder text for a dependent select whose parent is empty.
    pub fn placeholder_for(&self, parent_label: &str) -> String {
        self.placeholder_label.replace("{parent}", parent_label)
    }
}

fn config_path() -> Option<PathBuf> {
    env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
}
