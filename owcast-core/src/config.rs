use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::Units;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "OWCAST_CONFIG";
/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
/// Environment variable that overrides the configured base URL.
pub const BASE_URL_ENV: &str = "OWCAST_BASE_URL";

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// OpenWeatherMap API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Units used when `--units` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<Units>,

    /// Example TOML:
    /// base_url = "https://api.openweathermap.org/data/2.5"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load config from `path`, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file, honoring `OWCAST_CONFIG`.
    pub fn config_file_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let dirs = ProjectDirs::from("dev", "owcast", "owcast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Stored API key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn units(&self) -> Units {
        self.units.unwrap_or_default()
    }

    /// Base URL, with `env_base_url` (see [`env_base_url`]) taking precedence over the file.
    pub fn resolved_base_url(&self, env_base_url: Option<String>) -> Option<String> {
        env_base_url.or_else(|| {
            self.base_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_owned)
        })
    }
}

/// Persists the single API credential.
pub trait CredentialStore {
    fn get(&self) -> Result<Option<String>>;
    fn set(&mut self, value: &str) -> Result<()>;
}

/// Credential kept in the `api_key` field of the TOML config file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by the default config file location.
    pub fn from_default_location() -> Result<Self> {
        Ok(Self::new(Config::config_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<String>> {
        let cfg = Config::load_from(&self.path)?;
        Ok(cfg.api_key().map(str::to_owned))
    }

    fn set(&mut self, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            return Err(anyhow!("Refusing to store an empty API key"));
        }

        // Keep any other settings already in the file.
        let mut cfg = Config::load_from(&self.path)?;
        cfg.api_key = Some(value.to_string());
        cfg.save_to(&self.path)
    }
}

/// Non-blank value of `OPENWEATHER_API_KEY`.
pub fn env_api_key() -> Option<String> {
    non_blank_env(API_KEY_ENV)
}

/// Non-blank value of `OWCAST_BASE_URL`.
pub fn env_base_url() -> Option<String> {
    non_blank_env(BASE_URL_ENV)
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The environment key when there is one, otherwise whatever `store` holds.
pub fn resolve_api_key(
    env_key: Option<String>,
    store: &dyn CredentialStore,
) -> Result<Option<String>> {
    match env_key {
        Some(key) => Ok(Some(key)),
        None => store.get(),
    }
}
