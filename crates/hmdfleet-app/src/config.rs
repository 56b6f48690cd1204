//! Settings parser for the hmdfleet config.toml

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hmdfleet_core::prelude::*;
use hmdfleet_core::types::Credentials;

const CONFIG_FILENAME: &str = "config.toml";

/// Process-wide settings, loaded at startup and mutable at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Username substituted when a connect request carries none
    pub default_username: String,

    /// Password substituted when a connect request carries none
    pub default_password: String,

    /// Per-device connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Reconnect to saved devices automatically at startup
    pub auto_reconnect: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_username: "admin".to_string(),
            default_password: String::new(),
            connect_timeout_secs: 15,
            auto_reconnect: true,
        }
    }
}

impl Settings {
    /// The default credentials as a pair
    pub fn default_credentials(&self) -> Credentials {
        Credentials::new(&self.default_username, &self.default_password)
    }

    pub fn set_default_credentials(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.default_username = username.into();
        self.default_password = password.into();
    }
}

/// The default config directory (`~/.config/hmdfleet`)
pub fn config_dir() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("hmdfleet")
}

/// Load settings from `<dir>/config.toml`
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(dir: &Path) -> Settings {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Save settings to `<dir>/config.toml`
///
/// Uses atomic write (temp file + rename) for safety.
pub fn save_settings(dir: &Path, settings: &Settings) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;
    }

    let config_path = dir.join(CONFIG_FILENAME);
    let temp_path = dir.join(".config.toml.tmp");

    let header = "# hmdfleet configuration\n\
                  # default_username/default_password fill in connect requests that omit them.\n";
    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;

    std::fs::write(&temp_path, format!("{}{}", header, content))
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;
    std::fs::rename(&temp_path, &config_path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved settings to {:?}", config_path);
    Ok(())
}
