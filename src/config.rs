//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the kitchen-epaper.toml
//! file. It provides a centralized way to configure where icons live, where the
//! calendar export and forecast come from, and how output images are encoded.
//!
//! Every section has defaults, so a partial file (or no file at all) still
//! produces a usable configuration.

use crate::output::PreviewMode;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "kitchen-epaper.toml";

/// Application configuration loaded from kitchen-epaper.toml
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Icon asset location
    pub assets: AssetConfig,
    /// Calendar export settings
    pub calendar: CalendarConfig,
    /// Forecast source settings
    pub weather: WeatherConfig,
    /// Output encoding settings
    pub output: OutputConfig,
}

/// Icon asset configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding `<key>.png` for every icon key
    pub icon_dir: PathBuf,
    /// Additional keys to load at startup, e.g. raw provider symbol codes
    pub extra_icons: Vec<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            icon_dir: PathBuf::from("icons"),
            extra_icons: Vec::new(),
        }
    }
}

/// Calendar export configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// JSON export of upcoming events (`events.list` response shape)
    pub events_path: PathBuf,
    /// Number of days shown, starting today
    pub days: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            events_path: PathBuf::from("events.json"),
            days: 3,
        }
    }
}

/// How weather icon keys are chosen from provider symbol codes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconKeyMode {
    /// Map symbol codes onto the standard icon keys
    #[default]
    Mapped,
    /// Use the symbol code itself when an icon with that key is loaded
    Symbol,
}

/// Forecast source configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Location for the met.no forecast; no network fetch when unset
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Offline forecast JSON used instead of fetching
    pub forecast_path: Option<PathBuf>,
    /// met.no rejects requests without an identifying User-Agent
    pub user_agent: String,
    /// Forecast cache file
    pub cache_path: PathBuf,
    /// Cache TTL in minutes
    pub cache_ttl_minutes: u64,
    pub icon_keys: IconKeyMode,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            forecast_path: None,
            user_agent: "kitchen-epaper/1.0".to_string(),
            cache_path: PathBuf::from("/tmp/kitchen_epaper_forecast.json"),
            cache_ttl_minutes: 30,
            icon_keys: IconKeyMode::Mapped,
        }
    }
}

/// Output encoding configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used when the request carries no hint
    pub default_format: String,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Quantization applied to PNG previews
    pub preview: PreviewMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "png".to_string(),
            jpeg_quality: 85,
            preview: PreviewMode::Dithered,
        }
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format in {}: {}", path.display(), e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!(
                    "No config file at {}, using default configuration",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Save current configuration as pretty TOML
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
