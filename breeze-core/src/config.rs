use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use crate::{
    location::PermissionSetting,
    model::{Coordinate, TemperatureUnit},
    provider::{Source, climate::DEFAULT_REFERENCE_YEARS},
};

/// Debounce applied to search-as-you-type when the config does not say otherwise.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Override for a single source's base URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
}

/// Where the "current location" comes from and whether it may be used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub permission: PermissionSetting,

    /// Fixed position used instead of IP geolocation.
    pub home: Option<Coordinate>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub debounce_ms: Option<u64>,

    pub temperature_unit: TemperatureUnit,

    /// Years compared against the current one; defaults to every decade since 1980.
    pub reference_years: Option<Vec<i32>>,

    pub location: LocationConfig,

    /// Example TOML:
    /// [endpoints.pollen]
    /// url = "http://localhost:8080/api/pollen"
    pub endpoints: HashMap<String, EndpointConfig>,
}

impl Config {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }

    /// Reference years for the climate comparison.
    pub fn reference_years(&self) -> Result<Vec<i32>> {
        match &self.reference_years {
            None => Ok(DEFAULT_REFERENCE_YEARS.to_vec()),
            Some(years) if years.is_empty() => Err(anyhow!(
                "At least one reference year is required.\n\
                 Hint: remove `reference_years` from the config file to use the defaults."
            )),
            Some(years) => Ok(years.clone()),
        }
    }

    /// Base URL for a source: the configured override or the built-in default.
    pub fn endpoint(&self, source: Source) -> String {
        self.endpoints
            .get(source.as_str())
            .map(|e| e.url.clone())
            .unwrap_or_else(|| source.default_endpoint().to_string())
    }

    pub fn has_endpoint_override(&self, source: Source) -> bool {
        self.endpoints.contains_key(source.as_str())
    }

    /// Set or replace the base URL for a source.
    pub fn upsert_endpoint(&mut self, source: Source, url: String) {
        self.endpoints.insert(source.as_str().to_string(), EndpointConfig { url });
    }

    pub fn remove_endpoint(&mut self, source: Source) -> bool {
        self.endpoints.remove(source.as_str()).is_some()
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.reference_years()?;
        for key in cfg.endpoints.keys() {
            Source::try_from(key.as_str())?;
        }
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("earth", "breeze", "breeze")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
