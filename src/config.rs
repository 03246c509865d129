//! Configuration Module
//! TOML settings for the dataset location, selected regions and chart outputs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Regions drawn in the per-region panels.
pub const DEFAULT_REGIONS: [&str; 4] = ["JHM", "LBK", "PHA", "STC"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Separator must be a single ASCII character, got '{0}'")]
    InvalidSeparator(char),
    #[error("At least one region must be selected")]
    NoRegions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub regions: Vec<String>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    pub separator: char,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub consequences: String,
    pub damage: String,
    pub surface: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("accidents.csv"),
            separator: ',',
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            consequences: "01_consequences.png".to_string(),
            damage: "02_damage.png".to_string(),
            surface: "03_surface.png".to_string(),
        }
    }
}

impl AppConfig {
    /// Read a TOML config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.separator_byte()?;
        if self.regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }
        Ok(())
    }

    /// CSV separator as the byte Polars expects.
    pub fn separator_byte(&self) -> Result<u8, ConfigError> {
        let separator = self.data.separator;
        if separator.is_ascii() {
            Ok(separator as u8)
        } else {
            Err(ConfigError::InvalidSeparator(separator))
        }
    }
}

impl OutputConfig {
    pub fn consequences_path(&self) -> PathBuf {
        self.dir.join(&self.consequences)
    }

    pub fn damage_path(&self) -> PathBuf {
        self.dir.join(&self.damage)
    }

    pub fn surface_path(&self) -> PathBuf {
        self.dir.join(&self.surface)
    }
}
