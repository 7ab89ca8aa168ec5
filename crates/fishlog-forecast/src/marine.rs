//! Current sea-surface temperature from the Open-Meteo marine API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::http::{build_client, get_json, join_url, HttpSettings};

const SERVICE: &str = "open-meteo marine";

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://marine-api.open-meteo.com";

/// Source of current sea-surface temperature.
#[async_trait]
pub trait SeaTempSource: Send + Sync {
    /// Current sea-surface temperature in °C near the coordinates.
    ///
    /// `Ok(None)` means the service answered but has no value for the
    /// point (e.g. it falls on land).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    async fn fetch_sea_surface_temp(&self, lat: f64, lon: f64) -> Result<Option<f64>>;
}

/// Client for the Open-Meteo marine endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteoMarineClient {
    client: reqwest::Client,
    base_url: String,
    timezone: String,
}

impl OpenMeteoMarineClient {
    /// Create a client against `base_url`.
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

#[derive(Debug, Deserialize)]
struct RawMarine {
    #[serde(default)]
    current: Option<RawCurrent>,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    #[serde(default)]
    sea_surface_temperature: Option<f64>,
}

#[async_trait]
impl SeaTempSource for OpenMeteoMarineClient {
    async fn fetch_sea_surface_temp(&self, lat: f64, lon: f64) -> Result<Option<f64>> {
        let url = join_url(&self.base_url, "v1/marine");
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current", "sea_surface_temperature".to_string()),
            ("timezone", self.timezone.clone()),
        ];

        let raw: RawMarine = get_json(&self.client, SERVICE, &url, &query).await?;
        let sst = raw.current.and_then(|c| c.sea_surface_temperature);
        debug!(lat, lon, ?sst, "sea surface temperature fetched");
        Ok(sst)
    }
}
