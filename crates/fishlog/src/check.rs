//! Pre-trip check and tide/weather autofill.
//!
//! Each external lookup stands alone: a failing service is logged and noted
//! on the report, and the remaining sections are still filled in.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use fishlog_forecast::{
    every_3_hours, SeaTempSource, TideDay, TideSample, TideSource, WeatherHour, WeatherSource,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Spot;
use crate::error::Result;
use crate::trip::{NewTrip, TidePhase};

/// Sea-temperature point used when a spot has no coordinates.
pub const FALLBACK_SEA_POINT: (f64, f64) = (35.6, 139.9);

/// Size of the tide graph image.
pub const CHART_SIZE: (u32, u32) = (768, 512);

/// The services a check consults.
#[derive(Clone, Copy)]
pub struct Sources<'a> {
    /// Tide tables.
    pub tide: &'a dyn TideSource,
    /// Hourly weather.
    pub weather: &'a dyn WeatherSource,
    /// Sea-surface temperature.
    pub sea: &'a dyn SeaTempSource,
}

impl std::fmt::Debug for Sources<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sources").finish_non_exhaustive()
    }
}

/// Outcome of one lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "value")]
pub enum Lookup<T> {
    /// The service answered.
    Ok(T),
    /// Not attempted, with the reason.
    Skipped(String),
    /// The service failed, with the error text.
    Failed(String),
}

impl<T> Lookup<T> {
    fn from_result(section: &'static str, result: fishlog_forecast::Result<T>) -> Self {
        match result {
            Ok(v) => Self::Ok(v),
            Err(e) => {
                warn!(section, error = %e, "lookup failed");
                Self::Failed(e.to_string())
            }
        }
    }
}

/// Everything the check view shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    /// Spot name.
    pub spot: String,
    /// Day checked.
    pub date: NaiveDate,
    /// Tide graph image.
    pub chart_url: String,
    /// The day's tide table.
    pub tide: Lookup<TideDay>,
    /// 3-hourly weather.
    pub weather: Lookup<Vec<WeatherHour>>,
    /// Current sea-surface temperature; `Ok(None)` when the service has none.
    pub sea_temp: Lookup<Option<f64>>,
    /// Coordinates the sea temperature was read at.
    pub sea_point: (f64, f64),
}

impl CheckReport {
    /// Sections that could not be filled in.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Lookup::Failed(e) = &self.tide {
            out.push(format!("tide: {e}"));
        }
        if let Lookup::Failed(e) = &self.weather {
            out.push(format!("weather: {e}"));
        }
        if let Lookup::Failed(e) = &self.sea_temp {
            out.push(format!("sea temperature: {e}"));
        }
        out
    }
}

/// Run the pre-trip check for `spot` on `date`.
///
/// The three lookups run concurrently.
pub async fn run_check(spot: &Spot, date: NaiveDate, sources: Sources<'_>) -> CheckReport {
    let port = spot.port();
    let (width, height) = CHART_SIZE;
    let chart_url = sources.tide.chart_image_url(&port, date, width, height);
    let sea_point = spot.coordinates().unwrap_or(FALLBACK_SEA_POINT);

    let tide_fut = sources.tide.fetch_day(&port, date);
    let weather_fut = async {
        match spot.coordinates() {
            Some((lat, lon)) => Lookup::from_result(
                "weather",
                sources
                    .weather
                    .fetch_hourly(lat, lon, date)
                    .await
                    .map(|hours| every_3_hours(&hours)),
            ),
            None => Lookup::Skipped(format!("no coordinates configured for {}", spot.name)),
        }
    };
    let sea_fut = sources.sea.fetch_sea_surface_temp(sea_point.0, sea_point.1);

    let (tide, weather, sea_temp) = tokio::join!(tide_fut, weather_fut, sea_fut);
    debug!(spot = %spot.name, %date, "check complete");

    CheckReport {
        spot: spot.name.clone(),
        date,
        chart_url,
        tide: Lookup::from_result("tide", tide),
        weather,
        sea_temp: Lookup::from_result("sea temperature", sea_temp),
        sea_point,
    }
}

/// Tide height at `time` for `spot` on `date`.
///
/// # Errors
///
/// Returns an error if the tide service fails.
pub async fn tide_at(
    spot: &Spot,
    date: NaiveDate,
    time: NaiveTime,
    tide: &dyn TideSource,
) -> Result<(TideDay, Option<TideSample>)> {
    let day = tide.fetch_day(&spot.port(), date).await?;
    let nearest = day.nearest(time);
    Ok((day, nearest))
}

/// What [`autofill`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Autofill {
    /// Fields that were filled.
    pub filled: Vec<&'static str>,
    /// Lookups that failed.
    pub warnings: Vec<String>,
}

/// The hour whose start is closest to `at`.
fn nearest_hour(hours: &[WeatherHour], at: NaiveDateTime) -> Option<&WeatherHour> {
    hours
        .iter()
        .min_by_key(|h| (h.time - at).num_minutes().abs())
}

/// Fill missing tide height, tide phase and temperature from the services.
///
/// Fields that already hold a value are left alone. Tide height and
/// temperature need a real time of day; without one only the phase is
/// looked up.
pub async fn autofill(trip: &mut NewTrip, spot: &Spot, sources: Sources<'_>) -> Autofill {
    let mut report = Autofill::default();
    let time = trip.time.filter(|t| *t != crate::trip::blank_time());

    let wants_tide = trip.tide_phase == TidePhase::Unknown
        || (trip.tide_height.is_none() && time.is_some());
    if wants_tide {
        match sources.tide.fetch_day(&spot.port(), trip.date).await {
            Ok(day) => {
                if trip.tide_phase == TidePhase::Unknown {
                    if let Some(phase) = day.phase_title.as_deref().and_then(|t| t.parse().ok()) {
                        trip.tide_phase = phase;
                        report.filled.push("tide phase");
                    }
                }
                if trip.tide_height.is_none() {
                    if let Some(sample) = time.and_then(|t| day.nearest(t)) {
                        trip.tide_height = Some(sample.cm);
                        report.filled.push("tide height");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "tide autofill failed");
                report.warnings.push(format!("tide: {e}"));
            }
        }
    }

    if trip.temperature.is_none() {
        if let (Some(t), Some((lat, lon))) = (time, spot.coordinates()) {
            match sources.weather.fetch_hourly(lat, lon, trip.date).await {
                Ok(hours) => {
                    let at = trip.date.and_time(t);
                    if let Some(temp) = nearest_hour(&hours, at).and_then(|h| h.temp) {
                        trip.temperature = Some(temp);
                        report.filled.push("temperature");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "weather autofill failed");
                    report.warnings.push(format!("weather: {e}"));
                }
            }
        }
    }

    report
}
