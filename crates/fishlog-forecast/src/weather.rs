//! Hourly weather from the Open-Meteo forecast API.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::{build_client, get_json, join_url, HttpSettings};

const SERVICE: &str = "open-meteo";

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

const HOURLY_FIELDS: &str =
    "temperature_2m,precipitation,weather_code,wind_speed_10m,wind_direction_10m";

/// One hour of forecast weather.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherHour {
    /// Local time at the start of the hour.
    pub time: NaiveDateTime,
    /// Air temperature at 2 m, °C.
    pub temp: Option<f64>,
    /// Precipitation, mm.
    pub rain: Option<f64>,
    /// Wind speed at 10 m, m/s.
    pub wind_speed: Option<f64>,
    /// Direction the wind comes from, degrees.
    pub wind_dir: Option<f64>,
    /// WMO weather interpretation code.
    pub weather_code: Option<u16>,
}

/// Source of hourly weather.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch every hour of `date` at the given coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    async fn fetch_hourly(&self, lat: f64, lon: f64, date: NaiveDate) -> Result<Vec<WeatherHour>>;
}

/// Client for the Open-Meteo forecast endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
    timezone: String,
}

impl OpenMeteoClient {
    /// Create a client against `base_url`, reporting times in `timezone`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timezone: impl Into<String>,
        settings: &HttpSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(SERVICE, settings)?,
            base_url: base_url.into(),
            timezone: timezone.into(),
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn fetch_hourly(&self, lat: f64, lon: f64, date: NaiveDate) -> Result<Vec<WeatherHour>> {
        let url = join_url(&self.base_url, "v1/forecast");
        let day = date.format("%Y-%m-%d").to_string();
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("wind_speed_unit", "ms".to_string()),
            ("timezone", self.timezone.clone()),
            ("start_date", day.clone()),
            ("end_date", day),
        ];

        let raw: RawForecast = get_json(&self.client, SERVICE, &url, &query).await?;
        let hours = parse_hourly(raw)?;
        debug!(lat, lon, %date, hours = hours.len(), "hourly weather fetched");
        Ok(hours)
    }
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    hourly: Option<RawHourly>,
}

#[derive(Debug, Deserialize)]
struct RawHourly {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<u16>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    wind_direction_10m: Vec<Option<f64>>,
}

fn parse_hourly(raw: RawForecast) -> Result<Vec<WeatherHour>> {
    let hourly = raw
        .hourly
        .ok_or_else(|| Error::missing(SERVICE, "hourly block"))?;

    hourly
        .time
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let time = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M")
                .map_err(|e| Error::decode(SERVICE, format!("bad time {text:?}: {e}")))?;
            Ok(WeatherHour {
                time,
                temp: at(&hourly.temperature_2m, i),
                rain: at(&hourly.precipitation, i),
                wind_speed: at(&hourly.wind_speed_10m, i),
                wind_dir: at(&hourly.wind_direction_10m, i),
                weather_code: at(&hourly.weather_code, i),
            })
        })
        .collect()
}

fn at<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

/// Keep the hours 00, 03, ..., 21.
#[must_use]
pub fn every_3_hours(hours: &[WeatherHour]) -> Vec<WeatherHour> {
    hours
        .iter()
        .filter(|h| h.time.minute() == 0 && h.time.hour() % 3 == 0)
        .copied()
        .collect()
}

/// Short description of a WMO weather interpretation code.
#[must_use]
pub fn weather_code_label(code: u16) -> &'static str {
    match code {
        0 => "clear",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 | 48 => "fog",
        51 | 53 | 55 => "drizzle",
        56 | 57 => "freezing drizzle",
        61 | 63 | 65 => "rain",
        66 | 67 => "freezing rain",
        71 | 73 | 75 => "snow",
        77 => "snow grains",
        80..=82 => "rain showers",
        85 | 86 => "snow showers",
        95 => "thunderstorm",
        96 | 99 => "thunderstorm with hail",
        _ => "unknown",
    }
}

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

// Arrows point where the wind blows to, so a north wind points down.
const ARROWS: [&str; 8] = ["↓", "↙", "←", "↖", "↑", "↗", "→", "↘"];

/// Compass name and arrow for a wind coming from `degrees`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn wind_dir_arrow(degrees: f64) -> String {
    let deg = degrees.rem_euclid(360.0);
    let point = ((deg + 11.25) / 22.5).floor() as usize % 16;
    let arrow = ((deg + 22.5) / 45.0).floor() as usize % 8;
    format!("{} {}", COMPASS[point], ARROWS[arrow])
}

/// Rough wind strength bands for shore fishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindLevel {
    /// Below 5 m/s.
    Calm,
    /// 5 m/s up to 8 m/s.
    Breezy,
    /// 8 m/s and above.
    Strong,
}

impl WindLevel {
    /// Classify a wind speed in m/s.
    #[must_use]
    pub fn from_speed(speed: f64) -> Self {
        if speed >= 8.0 {
            Self::Strong
        } else if speed >= 5.0 {
            Self::Breezy
        } else {
            Self::Calm
        }
    }

    /// Marker shown next to the speed.
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Calm => "",
            Self::Breezy => "!",
            Self::Strong => "!!",
        }
    }
}
