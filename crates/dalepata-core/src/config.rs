use dalepata_api::RetryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::notifications::DEFAULT_WINDOW_DAYS;

/// Main configuration structure
///
/// Loaded from the config file; the CLI layers env vars and flags on top.
/// Priority: CLI > Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub notifications: NotificationConfig,
}

impl Config {
    /// Load config from default location, falling back to defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// XDG on Linux/macOS, AppData on Windows
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("dalepata");

        Ok(config_dir.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL, including the `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries for transient failures (network, 5xx, 429). Off by default.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    dalepata_api::client::DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    0
}

impl ApiConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            ..RetryConfig::default()
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Device storage file. Defaults to `{data_dir}/dalepata/storage.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_db_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
            .join("dalepata");

        Ok(data_dir.join("storage.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// How many days an approval or rejection stays in the feed
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

fn default_window_days() -> i64 {
    DEFAULT_WINDOW_DAYS
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}
