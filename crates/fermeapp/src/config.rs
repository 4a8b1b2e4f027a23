//! # Configuration
//!
//! Ferme configuration is a [`confique`] struct loaded in layers.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `FERME_DATA_FILE`, `FERME_READ_ONLY`, ...
//! 2. **Config file**: `ferme.toml` in the OS config directory (via `directories`).
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! Command-line flags are applied on top by the CLI after loading.
//!
//! ## Available Settings
//!
//! | Key | Env | Default | Description |
//! |-----|-----|---------|-------------|
//! | `data_file` | `FERME_DATA_FILE` | `<data dir>/db.json` | JSON document backing the store |
//! | `emulate_read_only` | `FERME_READ_ONLY` | `false` | Keep mutations in memory |
//! | `strict_queries` | `FERME_STRICT` | `false` | Reject unrecognized statements |
//! | `weather_description` | `FERME_WEATHER` | none | Current conditions fed to task prediction |
//! | `weather_temperature` | `FERME_TEMPERATURE` | none | Current temperature, e.g. `"34°C"` |

use crate::error::{FermeError, Result};
use crate::weather::{FixedWeather, NoWeather, WeatherAdvisory, WeatherSnapshot};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "ferme.toml";
pub const DATA_FILE_NAME: &str = "db.json";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FermeConfig {
    /// Path of the JSON document backing the store.
    #[config(env = "FERME_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Keep mutations in memory only.
    #[config(env = "FERME_READ_ONLY", default = false)]
    pub emulate_read_only: bool,

    /// Fail on statements the store does not recognize instead of returning nothing.
    #[config(env = "FERME_STRICT", default = false)]
    pub strict_queries: bool,

    #[config(env = "FERME_WEATHER")]
    pub weather_description: Option<String>,

    #[config(env = "FERME_TEMPERATURE")]
    pub weather_temperature: Option<String>,
}

impl Default for FermeConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            emulate_read_only: false,
            strict_queries: false,
            weather_description: None,
            weather_temperature: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "ferme", "ferme")
}

/// `ferme.toml` in the OS config directory, if one can be determined.
pub fn config_file_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl FermeConfig {
    /// Loads env and the OS config file.
    pub fn load() -> Result<Self> {
        match config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Self::builder()
                .env()
                .load()
                .map_err(|e| FermeError::Config(e.to_string())),
        }
    }

    /// Loads env and `path`. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::builder()
            .env()
            .file(path)
            .load()
            .map_err(|e| FermeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// The configured data file, else `<data dir>/db.json`.
    pub fn data_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.data_file {
            return Ok(path.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join(DATA_FILE_NAME))
            .ok_or_else(|| FermeError::Config("could not determine data directory".to_string()))
    }

    /// The configured weather snapshot. Description and temperature default to empty
    /// when only one of them is set.
    pub fn weather(&self) -> Option<WeatherSnapshot> {
        if self.weather_description.is_none() && self.weather_temperature.is_none() {
            return None;
        }
        Some(WeatherSnapshot::new(
            self.weather_description.clone().unwrap_or_default(),
            self.weather_temperature.clone().unwrap_or_default(),
        ))
    }

    pub fn advisory(&self) -> Box<dyn WeatherAdvisory> {
        match self.weather() {
            Some(snapshot) => Box::new(FixedWeather(snapshot)),
            None => Box::new(NoWeather),
        }
    }
}
