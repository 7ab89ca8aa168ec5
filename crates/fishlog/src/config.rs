//! Configuration management for fishlog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use fishlog_forecast::{HttpSettings, TidePort};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "fishlog";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "fishing_log.db";

/// Default sheet file name.
const SHEET_FILE_NAME: &str = "fishing_log.csv";

/// Environment variable prefix.
const ENV_PREFIX: &str = "FISHLOG_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FISHLOG_`, `__` between levels)
/// 2. TOML config file at `~/.config/fishlog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Tide and weather service configuration.
    pub forecast: ForecastConfig,
    /// Photo host configuration.
    pub images: ImagesConfig,
    /// Chart configuration.
    pub analysis: AnalysisConfig,
    /// Known fishing spots.
    pub spots: Vec<Spot>,
    /// Spot used when a command is not given one.
    pub default_spot: Option<String>,
}

/// Which store holds the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local SQLite database.
    #[default]
    Sqlite,
    /// Spreadsheet-style CSV file.
    Sheet,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Sqlite => "sqlite",
            Self::Sheet => "sheet",
        })
    }
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend to use.
    pub backend: Backend,
    /// Path to the database file.
    /// Defaults to `~/.local/share/fishlog/fishing_log.db`
    pub database_path: Option<PathBuf>,
    /// Path to the sheet file.
    /// Defaults to `~/.local/share/fishlog/fishing_log.csv`
    pub sheet_path: Option<PathBuf>,
}

/// Tide/weather/marine service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// tide736.net base URL.
    pub tide_base_url: String,
    /// Open-Meteo forecast base URL.
    pub weather_base_url: String,
    /// Open-Meteo marine base URL.
    pub marine_base_url: String,
    /// IANA timezone the weather hours are reported in.
    pub timezone: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Photo host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Cloudinary API base URL.
    pub base_url: String,
    /// Cloudinary cloud name.
    pub cloud_name: Option<String>,
    /// Unsigned upload preset.
    pub upload_preset: Option<String>,
    /// Folder uploads are placed in.
    pub folder: Option<String>,
}

/// Chart configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Upper edge of the heatmap tide axis (cm).
    pub tide_max_cm: u32,
    /// Heatmap tide bin width (cm).
    pub tide_step_cm: u32,
    /// Heatmap hour bin width: 1, 2 or 3.
    pub hour_step: u32,
}

/// A named fishing spot with its tide station and coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    /// Display name.
    pub name: String,
    /// tide736 prefecture code.
    pub pc: u32,
    /// tide736 harbour code.
    pub hc: String,
    /// Latitude.
    pub lat: Option<f64>,
    /// Longitude.
    pub lon: Option<f64>,
}

impl Spot {
    /// The tide station of this spot.
    #[must_use]
    pub fn port(&self) -> TidePort {
        TidePort {
            pc: self.pc,
            hc: self.hc.clone(),
        }
    }

    /// Coordinates, when both are set.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            forecast: ForecastConfig::default(),
            images: ImagesConfig::default(),
            analysis: AnalysisConfig::default(),
            spots: default_spots(),
            default_spot: Some("東京".to_string()),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            tide_base_url: fishlog_forecast::tide::DEFAULT_BASE_URL.to_string(),
            weather_base_url: fishlog_forecast::weather::DEFAULT_BASE_URL.to_string(),
            marine_base_url: fishlog_forecast::marine::DEFAULT_BASE_URL.to_string(),
            timezone: "Asia/Tokyo".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            base_url: fishlog_forecast::images::DEFAULT_BASE_URL.to_string(),
            cloud_name: None,
            upload_preset: None,
            folder: Some("fishing-log".to_string()),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tide_max_cm: 220,
            tide_step_cm: 20,
            hour_step: 2,
        }
    }
}

/// Tokyo Bay stations.
fn default_spots() -> Vec<Spot> {
    vec![
        Spot {
            name: "東京".to_string(),
            pc: 13,
            hc: "0001".to_string(),
            lat: Some(35.65),
            lon: Some(139.77),
        },
        Spot {
            name: "横浜".to_string(),
            pc: 14,
            hc: "0001".to_string(),
            lat: Some(35.45),
            lon: Some(139.65),
        },
        Spot {
            name: "千葉".to_string(),
            pc: 12,
            hc: "0001".to_string(),
            lat: Some(35.57),
            lon: Some(140.05),
        },
    ]
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation
    /// fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config = Self::figment(config_path).extract::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    /// The layered provider stack behind [`Config::load_from`].
    #[must_use]
    pub fn figment(config_path: Option<PathBuf>) -> Figment {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let analysis = &self.analysis;
        if analysis.tide_step_cm == 0 {
            return Err(invalid("analysis.tide_step_cm must be greater than 0"));
        }
        if analysis.tide_max_cm < analysis.tide_step_cm {
            return Err(invalid(format!(
                "analysis.tide_max_cm ({}) cannot be smaller than tide_step_cm ({})",
                analysis.tide_max_cm, analysis.tide_step_cm
            )));
        }
        if !(1..=3).contains(&analysis.hour_step) {
            return Err(invalid(format!(
                "analysis.hour_step must be 1, 2 or 3 (got {})",
                analysis.hour_step
            )));
        }

        if self.forecast.timeout_secs == 0 {
            return Err(invalid("forecast.timeout_secs must be greater than 0"));
        }

        for (i, spot) in self.spots.iter().enumerate() {
            if spot.name.trim().is_empty() {
                return Err(invalid(format!("spots[{i}] has an empty name")));
            }
            if self.spots[..i].iter().any(|s| s.name == spot.name) {
                return Err(invalid(format!("spot '{}' is defined twice", spot.name)));
            }
            if let Some(lat) = spot.lat {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(invalid(format!("spot '{}' latitude {lat} out of range", spot.name)));
                }
            }
            if let Some(lon) = spot.lon {
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(invalid(format!("spot '{}' longitude {lon} out of range", spot.name)));
                }
            }
        }

        if let Some(name) = &self.default_spot {
            if !self.spots.is_empty() && self.spot(name).is_none() {
                return Err(invalid(format!("default_spot '{name}' is not in spots")));
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the sheet path, resolving defaults if not set.
    #[must_use]
    pub fn sheet_path(&self) -> PathBuf {
        self.storage
            .sheet_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(SHEET_FILE_NAME))
    }

    /// Path of the active store.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        match self.storage.backend {
            Backend::Sqlite => self.database_path(),
            Backend::Sheet => self.sheet_path(),
        }
    }

    /// Look up a spot by name.
    #[must_use]
    pub fn spot(&self, name: &str) -> Option<&Spot> {
        self.spots.iter().find(|s| s.name == name)
    }

    /// Resolve `name`, falling back to the default spot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSpot`] if no such spot is configured.
    pub fn resolve_spot(&self, name: Option<&str>) -> Result<&Spot> {
        let name = name
            .or(self.default_spot.as_deref())
            .ok_or_else(|| Error::UnknownSpot("(no spot given and no default_spot)".to_string()))?;
        self.spot(name)
            .ok_or_else(|| Error::UnknownSpot(name.to_string()))
    }

    /// HTTP settings for the service clients.
    #[must_use]
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.forecast.timeout_secs),
            ..HttpSettings::default()
        }
    }

    /// Render the configuration as pretty JSON for `config show`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

/// Starter configuration written by `config init`.
pub const STARTER_CONFIG: &str = r#"# fishlog configuration

default_spot = "東京"

[storage]
# "sqlite" or "sheet"
backend = "sqlite"
# database_path = "/path/to/fishing_log.db"
# sheet_path = "/path/to/fishing_log.csv"

[forecast]
timezone = "Asia/Tokyo"
timeout_secs = 10

[images]
# cloud_name = "your-cloud"
# upload_preset = "unsigned-preset"
folder = "fishing-log"

[analysis]
tide_max_cm = 220
tide_step_cm = 20
hour_step = 2

[[spots]]
name = "東京"
pc = 13
hc = "0001"
lat = 35.65
lon = 139.77
"#;
