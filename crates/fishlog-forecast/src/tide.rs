//! Tide lookups against tide736.net.
//!
//! tide736 publishes tide tables for 736 Japanese ports. A port is
//! addressed by a prefecture code (`pc`) and a harbour code (`hc`); one
//! request returns the whole day's curve plus the high and low waters.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::http::{build_client, get_json, join_url, HttpSettings};

const SERVICE: &str = "tide736";

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.tide736.net";

/// A tide station as tide736 addresses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TidePort {
    /// Prefecture code.
    pub pc: u32,
    /// Harbour code within the prefecture.
    pub hc: String,
}

/// One point of the day's tide curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TideSample {
    /// Local time of the sample.
    pub time: NaiveTime,
    /// Tide height in centimetres.
    pub cm: f64,
}

/// Whether a tide event is a high or a low water.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TideEventKind {
    /// High water.
    High,
    /// Low water.
    Low,
}

/// A high or low water.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TideEvent {
    /// High or low.
    pub kind: TideEventKind,
    /// Local time of the event.
    pub time: NaiveTime,
    /// Tide height in centimetres.
    pub cm: f64,
}

/// The tide table for one port and one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TideDay {
    /// The day the table covers.
    pub date: NaiveDate,
    /// Tide phase name published for the day (e.g. `大潮`).
    pub phase_title: Option<String>,
    /// Moon age in days.
    pub moon_age: Option<f64>,
    /// The curve, in time order.
    pub samples: Vec<TideSample>,
    /// High and low waters, in time order.
    pub events: Vec<TideEvent>,
}

impl TideDay {
    /// The sample closest to `time` by absolute minute difference.
    ///
    /// Ties go to the earlier sample. Returns `None` for an empty curve.
    #[must_use]
    pub fn nearest(&self, time: NaiveTime) -> Option<TideSample> {
        let target = minutes_of(time);
        let mut best: Option<(i64, TideSample)> = None;
        for sample in &self.samples {
            let diff = (minutes_of(sample.time) - target).abs();
            match best {
                Some((best_diff, _)) if best_diff <= diff => {}
                _ => best = Some((diff, *sample)),
            }
        }
        best.map(|(_, sample)| sample)
    }

    /// Highest point of the curve.
    #[must_use]
    pub fn max_cm(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.cm).reduce(f64::max)
    }

    /// Lowest point of the curve.
    #[must_use]
    pub fn min_cm(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.cm).reduce(f64::min)
    }
}

fn minutes_of(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Source of daily tide tables.
#[async_trait]
pub trait TideSource: Send + Sync {
    /// Fetch the tide table for `port` on `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the day is not in the response.
    async fn fetch_day(&self, port: &TidePort, date: NaiveDate) -> Result<TideDay>;

    /// URL of a rendered tide graph for `port` on `date`.
    fn chart_image_url(&self, port: &TidePort, date: NaiveDate, width: u32, height: u32) -> String;
}

/// Client for the tide736.net JSON API.
#[derive(Debug, Clone)]
pub struct Tide736Client {
    client: reqwest::Client,
    base_url: String,
}

impl Tide736Client {
    /// Create a client against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, settings: &HttpSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(SERVICE, settings)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl TideSource for Tide736Client {
    async fn fetch_day(&self, port: &TidePort, date: NaiveDate) -> Result<TideDay> {
        let url = join_url(&self.base_url, "get_tide.php");
        let mut query = port_query(port, date);
        query.push(("rg", "day".to_string()));

        let raw: RawResponse = get_json(&self.client, SERVICE, &url, &query).await?;
        let day = parse_day(raw, date)?;
        debug!(
            pc = port.pc,
            hc = %port.hc,
            %date,
            samples = day.samples.len(),
            "tide day fetched"
        );
        Ok(day)
    }

    fn chart_image_url(&self, port: &TidePort, date: NaiveDate, width: u32, height: u32) -> String {
        chart_image_url(&self.base_url, port, date, width, height)
    }
}

fn port_query(port: &TidePort, date: NaiveDate) -> Vec<(&'static str, String)> {
    vec![
        ("pc", port.pc.to_string()),
        ("hc", port.hc.clone()),
        ("yr", date.year().to_string()),
        ("mn", date.month().to_string()),
        ("dy", date.day().to_string()),
    ]
}

/// Build the tide graph image URL for `port` on `date`.
#[must_use]
pub fn chart_image_url(
    base_url: &str,
    port: &TidePort,
    date: NaiveDate,
    width: u32,
    height: u32,
) -> String {
    let mut params: Vec<String> = port_query(port, date)
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    params.extend([
        "rg=day".to_string(),
        format!("w={width}"),
        format!("h={height}"),
        "lc=blue".to_string(),
        "gcs=cyan".to_string(),
        "gcf=blue".to_string(),
        "ld=on".to_string(),
        "ttd=on".to_string(),
        "tsmd=on".to_string(),
    ]);
    format!(
        "{}?{}",
        join_url(base_url, "tide_image.php"),
        params.join("&")
    )
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    tide: Option<RawTide>,
}

#[derive(Debug, Deserialize)]
struct RawTide {
    #[serde(default)]
    chart: BTreeMap<String, RawChart>,
}

#[derive(Debug, Deserialize)]
struct RawChart {
    #[serde(default)]
    moon: Option<RawMoon>,
    #[serde(default)]
    edd: Vec<RawPoint>,
    #[serde(default)]
    flood: Vec<RawPoint>,
    #[serde(default)]
    tide: Vec<RawPoint>,
}

#[derive(Debug, Deserialize)]
struct RawMoon {
    #[serde(default)]
    age: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    time: String,
    cm: f64,
}

fn parse_day(raw: RawResponse, date: NaiveDate) -> Result<TideDay> {
    if !raw.status {
        return Err(Error::decode(
            SERVICE,
            raw.message.unwrap_or_else(|| "status=false".to_string()),
        ));
    }

    let key = date.format("%Y-%m-%d").to_string();
    let chart = raw
        .tide
        .and_then(|mut t| t.chart.remove(&key))
        .ok_or_else(|| Error::missing(SERVICE, format!("chart for {key}")))?;

    let samples = chart
        .tide
        .iter()
        .filter_map(|p| parse_time(&p.time).map(|time| TideSample { time, cm: p.cm }))
        .collect();

    let mut events: Vec<TideEvent> = chart
        .flood
        .iter()
        .map(|p| (TideEventKind::High, p))
        .chain(chart.edd.iter().map(|p| (TideEventKind::Low, p)))
        .filter_map(|(kind, p)| {
            parse_time(&p.time).map(|time| TideEvent {
                kind,
                time,
                cm: p.cm,
            })
        })
        .collect();
    events.sort_by_key(|e| e.time);

    let (phase_title, moon_age) = match chart.moon {
        Some(moon) => (
            moon.title.filter(|t| !t.trim().is_empty()),
            moon.age.as_ref().and_then(value_as_f64),
        ),
        None => (None, None),
    };

    Ok(TideDay {
        date,
        phase_title,
        moon_age,
        samples,
        events,
    })
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let parsed = NaiveTime::parse_from_str(text.trim(), "%H:%M").ok();
    if parsed.is_none() {
        trace!(text, "skipping unparseable tide time");
    }
    parsed
}

fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
