//! Configuration loading and management
//!
//! Handles parsing of `tabboard.toml`. The default location is the
//! platform config directory; a missing file means defaults.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage::STORE_FILE;
use crate::todo::TodoFilter;

/// Name of the configuration file
pub const CONFIG_FILE: &str = "tabboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Where the key-value store lives
    #[serde(default)]
    pub storage: StorageConfig,

    /// To-do panel configuration
    #[serde(default)]
    pub todos: TodosConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Store file; defaults to `<data dir>/storage.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// How long to wait for the store lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// To-do configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TodosConfig {
    /// Store key holding the task collection
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Prefix of generated task ids
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Age in days after which completed tasks are cleared
    #[serde(default = "default_clear_after_days")]
    pub clear_after_days: u32,

    /// Filter tab selected on startup
    #[serde(default)]
    pub default_filter: TodoFilter,
}

fn default_storage_key() -> String {
    "todos".to_string()
}

fn default_id_prefix() -> String {
    "todo".to_string()
}

fn default_clear_after_days() -> u32 {
    7
}

impl Default for TodosConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            id_prefix: default_id_prefix(),
            clear_after_days: default_clear_after_days(),
            default_filter: TodoFilter::default(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "tabboard")
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise return defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Default config file location, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Store file to use: configured path or the platform data dir
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage.path {
            return Ok(path.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join(STORE_FILE))
            .ok_or_else(|| {
                Error::InvalidConfig(
                    "no data directory available; set storage.path or --store".to_string(),
                )
            })
    }

    fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        self.todos.validate()?;
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "storage.lock_timeout_ms must be >= 1".to_string(),
            ));
        }
        if let Some(path) = &self.path {
            if path.as_os_str().is_empty() {
                return Err(Error::InvalidConfig(
                    "storage.path cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl TodosConfig {
    fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "todos.storage_key cannot be empty".to_string(),
            ));
        }
        let prefix = self.id_prefix.trim();
        if prefix.is_empty() {
            return Err(Error::InvalidConfig(
                "todos.id_prefix cannot be empty".to_string(),
            ));
        }
        if !prefix.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(Error::InvalidConfig(
                "todos.id_prefix must be alphanumeric".to_string(),
            ));
        }
        if self.clear_after_days == 0 {
            return Err(Error::InvalidConfig(
                "todos.clear_after_days must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
