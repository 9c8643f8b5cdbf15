//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, the storage backend and the last email
//! used to sign in.
//!
//! Configuration is stored at `~/.config/taskdesk/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::{FileStorage, KeyringStorage, Storage};

/// Application name used for config/data directory paths
const APP_NAME: &str = "taskdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when neither the config nor the environment names one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "TASKDESK_API_URL";

/// Where session and preference keys are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the storage file and logs
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Base URL to use: the environment override, then the config, then the default
    pub fn api_base_url(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// Open the configured storage backend
    pub fn open_storage(&self) -> Result<Box<dyn Storage>> {
        debug!(backend = ?self.storage, "Opening storage");
        match self.storage {
            StorageBackend::File => {
                let storage = FileStorage::in_dir(&self.data_dir()?)
                    .context("Failed to open storage file")?;
                Ok(Box::new(storage))
            }
            StorageBackend::Keyring => {
                let storage = KeyringStorage::open()
                    .context("Keyring storage selected in config but unusable; set \"storage\": \"file\"")?;
                Ok(Box::new(storage))
            }
        }
    }
}
