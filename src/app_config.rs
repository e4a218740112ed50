use crate::merge::NameMatching;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<DestinationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct DestinationConfig {
    /// Directory holding the `CustomView` document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// File name of the `CustomView` document inside `dir`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ImportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collision_match: Option<NameMatching>,
}

impl AppConfig {
    /// Load the application configuration from the default path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Unable to determine the config directory
    /// - Unable to read the config file (other than it not existing)
    /// - The config file contains invalid TOML
    pub fn load() -> Result<Option<Self>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config at {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Get the path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if unable to determine the config directory
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
            Ok(PathBuf::from(config_home).join("rdgmerge").join("config.toml"))
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", "rdgmerge") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            anyhow::bail!("Could not determine config directory")
        }
    }

    pub fn destination_dir(&self) -> Option<&PathBuf> {
        self.destination.as_ref().and_then(|d| d.dir.as_ref())
    }

    pub fn destination_file(&self) -> Option<&str> {
        self.destination.as_ref().and_then(|d| d.file.as_deref())
    }

    pub fn collision_match(&self) -> Option<NameMatching> {
        self.import.and_then(|i| i.collision_match)
    }
}
